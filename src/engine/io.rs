//! WAV file I/O for Melseal
//!
//! Decodes WAV files into mono `Waveform`s at their native sample rate and
//! writes waveforms back out as 32-bit float WAV. No resampling is done:
//! features are extracted at whatever rate the audio arrives at, and the
//! verifier must see that same rate.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::engine::buffer::Waveform;
use crate::error::{MelsealError, Result};

/// Import a WAV file as a mono waveform
///
/// Integer PCM is normalized to -1.0..1.0. Multichannel audio is mixed down
/// by averaging the channels of each frame.
///
/// # Errors
/// * `AudioRead` - If the file cannot be opened or decoded
/// * `NonFiniteSample` - If a float WAV contains NaN/Inf
pub fn import_wav(path: &Path) -> Result<Waveform> {
    let reader = WavReader::open(path).map_err(|e| MelsealError::AudioRead {
        path: path.display().to_string(),
        source: e,
    })?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let interleaved = read_samples_as_f32(reader, spec).map_err(|e| MelsealError::AudioRead {
        path: path.display().to_string(),
        source: e,
    })?;

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels,
        bits = spec.bits_per_sample,
        "decoded WAV"
    );

    Waveform::new(downmix(&interleaved, channels), spec.sample_rate)
}

/// Export a waveform as a mono 32-bit float WAV file
///
/// Float output keeps every sample bit-exact, so the written audio verifies
/// against the signatures of the in-memory waveform.
pub fn export_wav(waveform: &Waveform, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let write_err = |e| MelsealError::AudioWrite {
        path: path.display().to_string(),
        source: e,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for &sample in waveform.samples() {
        writer.write_sample(sample).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)?;

    Ok(())
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    spec: WavSpec,
) -> std::result::Result<Vec<f32>, hound::Error> {
    match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => {
            // hound widens 8/16/24/32-bit PCM into i32
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    }
}

/// Average interleaved frames down to a single channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    #[test]
    fn test_downmix_averages_frames() {
        let stereo = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mono = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix(&mono, 1), mono);
    }

    #[test]
    fn test_round_trip_float_is_bit_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let original = Waveform::sine_wave(440.0, 0.5, 16000);
        export_wav(&original, &path).unwrap();
        let imported = import_wav(&path).unwrap();

        assert!(original.is_identical_to(&imported));
    }

    #[test]
    fn test_import_16bit_stereo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo16.wav");

        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384_i16).unwrap();
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        let imported = import_wav(&path).unwrap();
        assert_eq!(imported.sample_rate(), 8000);
        assert_eq!(imported.len(), 100);
        assert_relative_eq!(imported.samples()[0], 0.25);
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_wav(Path::new("/nonexistent/audio.wav"));
        assert!(matches!(result, Err(MelsealError::AudioRead { .. })));
    }
}
