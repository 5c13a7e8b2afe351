//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::crypto::{KeyPair, Signer, Verifier};
use crate::engine::{export_wav, import_wav};
use crate::error::Result;
use crate::pipeline::{PipelineConfig, SegmentPipeline, SignatureManifest, VerificationReport};

/// Resolve the pipeline config from an optional file plus flag overrides
pub fn resolve_config(
    config: Option<&Path>,
    segment_duration: Option<f64>,
) -> Result<PipelineConfig> {
    let mut resolved = match config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(duration) = segment_duration {
        resolved.segment_duration_secs = duration;
    }
    resolved.validate()?;
    Ok(resolved)
}

/// Where `process` writes its sidecar files
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessOutputs<'a> {
    pub manifest: Option<&'a Path>,
    pub public_key: Option<&'a Path>,
}

/// Sign a WAV file with a session key, write the signed audio, and verify it.
///
/// The private key exists only for the duration of this call; only the
/// public half can be written out.
pub fn process(
    input: &Path,
    output: &Path,
    sidecars: ProcessOutputs<'_>,
    config: PipelineConfig,
    key_bits: usize,
) -> Result<VerificationReport> {
    info!("Processing: {}", input.display());

    let waveform = import_wav(input)?;
    let pipeline = SegmentPipeline::new(config)?;

    info!("Generating {}-bit session key", key_bits);
    let keys = KeyPair::generate_with_bits(key_bits)?;
    let signer = Signer::new(&keys);

    let signed = pipeline.sign_and_reconstruct(&signer, &waveform)?;
    export_wav(&signed.waveform, output)?;
    println!("Signed audio: {}", output.display());

    if let Some(path) = sidecars.manifest {
        let manifest = SignatureManifest::new(&signed, pipeline.config(), signer.fingerprint());
        manifest.write(path)?;
        println!("Manifest: {}", path.display());
    }
    if let Some(path) = sidecars.public_key {
        fs::write(path, keys.public_key_pem()?)?;
        println!("Public key: {}", path.display());
    }

    let verifier = Verifier::new(&keys);
    let report = pipeline.verify_segments(&verifier, &signed.waveform, &signed.signatures)?;

    println!("Session: {}", signed.session_id);
    println!("Key fingerprint: {}", signer.fingerprint());
    println!(
        "Segments: {} x {} samples @ {} Hz",
        report.len(),
        report.segment_length(),
        waveform.sample_rate()
    );
    println!("Verification Results: {:?}", report.results());

    Ok(report)
}

/// Verify a WAV file against a manifest and an exported public key.
///
/// Segmentation follows the manifest unless `segment_duration` overrides it,
/// in which case a mismatch is reported before any verification work.
pub fn verify(
    input: &Path,
    manifest_path: &Path,
    public_key_path: &Path,
    base: PipelineConfig,
    segment_duration: Option<f64>,
) -> Result<VerificationReport> {
    info!("Verifying: {}", input.display());

    let waveform = import_wav(input)?;
    let manifest = SignatureManifest::read(manifest_path)?;
    let verifier = Verifier::from_public_key_pem(&fs::read_to_string(public_key_path)?)?;

    let config = match segment_duration {
        Some(duration) => PipelineConfig {
            segment_duration_secs: duration,
            ..base
        },
        None => manifest.pipeline_config(&base),
    };
    let pipeline = SegmentPipeline::new(config)?;
    let report = pipeline.verify_manifest(&verifier, &waveform, &manifest)?;

    println!("Session: {}", manifest.session_id);
    println!("Key fingerprint: {}", verifier.fingerprint());
    println!(
        "Segments: {} x {} samples @ {} Hz",
        report.len(),
        report.segment_length(),
        waveform.sample_rate()
    );
    println!("Verification Results: {:?}", report.results());

    Ok(report)
}

/// Print per-segment feature summaries.
pub fn features(input: &Path, config: PipelineConfig) -> Result<()> {
    info!("Extracting features: {}", input.display());

    let waveform = import_wav(input)?;
    let pipeline = SegmentPipeline::new(config)?;
    let features = pipeline.extract_features(&waveform)?;

    println!(
        "{} segments @ {} Hz ({:.2}s)",
        features.len(),
        waveform.sample_rate(),
        waveform.duration_secs()
    );
    println!("{:-<90}", "");

    for (index, buffer) in features.iter().enumerate() {
        let peak_db = 10.0 * buffer.max_power().max(1e-10).log10();
        let floor_db = buffer
            .power_to_db(Some(80.0))
            .into_iter()
            .fold(0.0_f32, f32::min);
        println!(
            "{:>4}: {}x{} peak {:>7.1} dB  range {:>5.1} dB  {}",
            index,
            buffer.n_mels(),
            buffer.n_frames(),
            peak_db,
            -floor_db,
            buffer.digest()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MIN_KEY_BITS;
    use crate::engine::Waveform;

    #[test]
    fn test_resolve_config_flag_overrides_default() {
        let config = resolve_config(None, Some(0.25)).unwrap();
        assert_eq!(config.segment_duration_secs, 0.25);
    }

    #[test]
    fn test_resolve_config_rejects_bad_override() {
        assert!(resolve_config(None, Some(-1.0)).is_err());
    }

    #[test]
    fn test_process_writes_identical_audio_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let manifest = dir.path().join("manifest.json");

        let waveform = Waveform::sine_wave(440.0, 2.5, 8000);
        export_wav(&waveform, &input).unwrap();

        let sidecars = ProcessOutputs {
            manifest: Some(&manifest),
            public_key: None,
        };
        let report =
            process(&input, &output, sidecars, PipelineConfig::default(), MIN_KEY_BITS).unwrap();

        assert_eq!(report.results(), vec![true, true, true]);
        assert!(import_wav(&output).unwrap().is_identical_to(&waveform));
        assert_eq!(SignatureManifest::read(&manifest).unwrap().signatures.len(), 3);
    }

    #[test]
    fn test_verify_reads_process_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let manifest = dir.path().join("manifest.json");
        let public_key = dir.path().join("key.pem");
        export_wav(&Waveform::sine_wave(440.0, 1.9, 8000), &input).unwrap();

        let sidecars = ProcessOutputs {
            manifest: Some(&manifest),
            public_key: Some(&public_key),
        };
        process(&input, &output, sidecars, PipelineConfig::default(), MIN_KEY_BITS).unwrap();

        let report =
            verify(&output, &manifest, &public_key, PipelineConfig::default(), None).unwrap();
        assert_eq!(report.results(), vec![true, true]);

        // Same segment count, different segment length
        let err = verify(&output, &manifest, &public_key, PipelineConfig::default(), Some(0.95))
            .unwrap_err();
        assert_eq!(err.error_code(), "MANIFEST_MISMATCH");
    }

    #[test]
    fn test_verify_flags_tampered_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let manifest = dir.path().join("manifest.json");
        let public_key = dir.path().join("key.pem");
        export_wav(&Waveform::sine_wave(440.0, 2.0, 8000), &input).unwrap();

        let sidecars = ProcessOutputs {
            manifest: Some(&manifest),
            public_key: Some(&public_key),
        };
        process(&input, &output, sidecars, PipelineConfig::default(), MIN_KEY_BITS).unwrap();

        let mut tampered = import_wav(&output).unwrap();
        tampered.samples_mut()[12000] += 0.25;
        export_wav(&tampered, &output).unwrap();

        let report =
            verify(&output, &manifest, &public_key, PipelineConfig::default(), None).unwrap();
        assert_eq!(report.results(), vec![true, false]);
    }

    #[test]
    fn test_features_reads_wav() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        export_wav(&Waveform::sine_wave(440.0, 1.5, 8000), &input).unwrap();

        assert!(features(&input, PipelineConfig::default()).is_ok());
        assert!(features(&dir.path().join("missing.wav"), PipelineConfig::default()).is_err());
    }
}
