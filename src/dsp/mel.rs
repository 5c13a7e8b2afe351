//! Mel spectrogram extraction
//!
//! Computes the mel-scaled power spectrogram that gets signed for each
//! segment. The parameters are part of the signing protocol: a signer and a
//! verifier only agree if they run the exact same transform, so every value
//! in [`MelConfig::protocol_v1`] is pinned and versioned by
//! [`FEATURE_PROTOCOL_VERSION`].
//!
//! # Transform
//! 1. Zero-pad `n_fft / 2` samples on both sides (centered frames)
//! 2. Frame with hop `hop_length`, apply a periodic Hann window
//! 3. FFT, take `|X|^power`
//! 4. Project onto Slaney-normalized triangular filters on the Slaney mel scale
//!
//! All intermediate math is f64; only the final values are rounded to f32.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlannerScalar};
use serde::{Deserialize, Serialize};

use crate::dsp::features::FeatureBuffer;

/// Version of the feature transform and its byte encoding.
///
/// Bump on any change to [`MelConfig::protocol_v1`] values, the filterbank
/// construction, or the canonical byte layout.
pub const FEATURE_PROTOCOL_VERSION: u32 = 1;

/// Sample rates whose filterbanks an extractor keeps cached
pub const MAX_CACHED_FILTERBANKS: usize = 8;

// Slaney mel scale constants
const MEL_F_SP: f64 = 200.0 / 3.0;
const MEL_MIN_LOG_HZ: f64 = 1000.0;
const MEL_MIN_LOG_MEL: f64 = MEL_MIN_LOG_HZ / MEL_F_SP;

fn mel_logstep() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Convert frequency in Hz to the Slaney mel scale
///
/// Linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MEL_MIN_LOG_HZ {
        MEL_MIN_LOG_MEL + (hz / MEL_MIN_LOG_HZ).ln() / mel_logstep()
    } else {
        hz / MEL_F_SP
    }
}

/// Convert a Slaney mel value back to Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MEL_MIN_LOG_MEL {
        MEL_MIN_LOG_HZ * (mel_logstep() * (mel - MEL_MIN_LOG_MEL)).exp()
    } else {
        mel * MEL_F_SP
    }
}

/// Configuration for mel spectrogram computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelConfig {
    /// FFT size, also the window length
    pub n_fft: usize,
    /// Hop length between frames
    pub hop_length: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// Lowest filter edge in Hz
    pub fmin: f64,
    /// Highest filter edge in Hz (defaults to Nyquist)
    pub fmax: Option<f64>,
    /// Exponent applied to the magnitude spectrum (2.0 = power)
    pub power: f64,
}

impl MelConfig {
    /// The pinned protocol parameters (version 1)
    pub const fn protocol_v1() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            fmin: 0.0,
            fmax: None,
            power: 2.0,
        }
    }

    /// Number of FFT bins kept (DC through Nyquist)
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for a segment of `num_samples`
    pub fn num_frames(&self, num_samples: usize) -> usize {
        1 + num_samples / self.hop_length.max(1)
    }
}

impl Default for MelConfig {
    fn default() -> Self {
        Self::protocol_v1()
    }
}

/// One triangular mel filter, stored sparsely from its first non-zero bin
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f64>,
}

/// Slaney-normalized triangular filterbank for one sample rate
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
    n_freqs: usize,
}

impl MelFilterbank {
    /// Build the filterbank for `sample_rate` under `config`
    pub fn new(config: &MelConfig, sample_rate: u32) -> Self {
        let n_freqs = config.n_freqs();
        let sr = sample_rate as f64;
        let fmax = config.fmax.unwrap_or(sr / 2.0);

        let fft_freqs: Vec<f64> = (0..n_freqs)
            .map(|k| k as f64 * sr / config.n_fft as f64)
            .collect();

        // n_mels + 2 edges evenly spaced in mel
        let mel_min = hz_to_mel(config.fmin);
        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f64> = (0..config.n_mels + 2)
            .map(|i| {
                let mel = mel_min + (mel_max - mel_min) * i as f64 / (config.n_mels + 1) as f64;
                mel_to_hz(mel)
            })
            .collect();

        let filters = (0..config.n_mels)
            .map(|m| {
                let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let rise = center - lo;
                let fall = hi - center;
                if rise <= 0.0 || fall <= 0.0 {
                    return MelFilter {
                        start: 0,
                        weights: Vec::new(),
                    };
                }
                let enorm = 2.0 / (hi - lo);

                let dense: Vec<f64> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - lo) / rise;
                        let upper = (hi - f) / fall;
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect();

                match dense.iter().position(|&w| w > 0.0) {
                    Some(start) => {
                        let end = dense.iter().rposition(|&w| w > 0.0).unwrap_or(start);
                        MelFilter {
                            start,
                            weights: dense[start..=end].to_vec(),
                        }
                    }
                    None => MelFilter {
                        start: 0,
                        weights: Vec::new(),
                    },
                }
            })
            .collect();

        Self { filters, n_freqs }
    }

    /// Number of mel bands
    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Dense weight of filter `mel` at FFT bin `bin`
    pub fn weight(&self, mel: usize, bin: usize) -> f64 {
        self.filters
            .get(mel)
            .and_then(|f| bin.checked_sub(f.start).and_then(|i| f.weights.get(i)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Apply filter `mel` to one power spectrum
    fn apply(&self, mel: usize, spectrum: &[f64]) -> f64 {
        let filter = &self.filters[mel];
        filter
            .weights
            .iter()
            .zip(&spectrum[filter.start..])
            .map(|(w, s)| w * s)
            .sum()
    }
}

/// Deterministic mel spectrogram extractor
///
/// Cheap to share across threads: the FFT plan and window are immutable and
/// filterbanks are cached per sample rate behind a lock. At most
/// [`MAX_CACHED_FILTERBANKS`] rates are cached; further rates are built on
/// every call.
pub struct MelSpectrogram {
    config: MelConfig,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
    filterbanks: RwLock<HashMap<u32, Arc<MelFilterbank>>>,
}

impl std::fmt::Debug for MelSpectrogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MelSpectrogram")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MelSpectrogram {
    /// Create an extractor with the given configuration
    pub fn new(config: MelConfig) -> Self {
        // Scalar planner: SIMD kernels are picked per CPU and could round
        // differently on the verifying machine.
        let mut planner = FftPlannerScalar::new();
        let fft = planner.plan_fft_forward(config.n_fft);

        Self {
            window: hann_window(config.n_fft),
            config,
            fft,
            filterbanks: RwLock::new(HashMap::new()),
        }
    }

    /// Create an extractor with the pinned protocol parameters
    pub fn protocol_v1() -> Self {
        Self::new(MelConfig::protocol_v1())
    }

    /// Get the configuration
    pub fn config(&self) -> &MelConfig {
        &self.config
    }

    /// Filterbank for `sample_rate`, built on first use
    pub fn filterbank(&self, sample_rate: u32) -> Arc<MelFilterbank> {
        if let Ok(cache) = self.filterbanks.read() {
            if let Some(fb) = cache.get(&sample_rate) {
                return Arc::clone(fb);
            }
        }

        let fb = Arc::new(MelFilterbank::new(&self.config, sample_rate));
        match self.filterbanks.write() {
            Ok(mut cache) => {
                if let Some(cached) = cache.get(&sample_rate) {
                    return Arc::clone(cached);
                }
                if cache.len() < MAX_CACHED_FILTERBANKS {
                    cache.insert(sample_rate, Arc::clone(&fb));
                }
                fb
            }
            Err(_) => fb,
        }
    }

    /// Number of sample rates with a cached filterbank
    pub fn cached_filterbanks(&self) -> usize {
        self.filterbanks.read().map_or(0, |cache| cache.len())
    }

    /// Extract the mel power spectrogram of one segment
    ///
    /// Returns a buffer of shape `n_mels x (1 + len / hop_length)`. An empty
    /// segment yields a single all-zero frame.
    pub fn extract(&self, samples: &[f32], sample_rate: u32) -> FeatureBuffer {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length.max(1);
        let n_mels = self.config.n_mels;
        let n_freqs = self.config.n_freqs();
        let pad = n_fft / 2;
        let n_frames = self.config.num_frames(samples.len());

        let filterbank = self.filterbank(sample_rate);
        let mut data = vec![0.0_f32; n_mels * n_frames];
        let mut buffer = vec![Complex::new(0.0_f64, 0.0); n_fft];
        let mut spectrum = vec![0.0_f64; n_freqs];

        for frame in 0..n_frames {
            // Frame starts at frame * hop in the padded signal
            let start = frame * hop;
            for (j, slot) in buffer.iter_mut().enumerate() {
                let sample = (start + j)
                    .checked_sub(pad)
                    .and_then(|i| samples.get(i))
                    .map_or(0.0, |&s| s as f64);
                *slot = Complex::new(sample * self.window[j], 0.0);
            }

            self.fft.process(&mut buffer);

            for (bin, power) in spectrum.iter_mut().enumerate() {
                *power = magnitude_power(buffer[bin], self.config.power);
            }

            for mel in 0..n_mels.min(filterbank.n_mels()) {
                data[mel * n_frames + frame] = filterbank.apply(mel, &spectrum) as f32;
            }
        }

        FeatureBuffer::new(data, n_mels, n_frames)
    }
}

impl Default for MelSpectrogram {
    fn default() -> Self {
        Self::protocol_v1()
    }
}

fn magnitude_power(value: Complex<f64>, power: f64) -> f64 {
    if power == 2.0 {
        value.norm_sqr()
    } else if power == 1.0 {
        value.norm()
    } else {
        value.norm().powf(power)
    }
}

/// Periodic Hann window (the DFT-even form used for spectral analysis)
fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / size as f64).cos())
        .collect()
}
