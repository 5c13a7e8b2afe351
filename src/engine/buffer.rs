//! Waveform buffer
//!
//! `Waveform` is the boundary type of the signing pipeline: mono f32 samples
//! plus the sample rate they were captured at.

use crate::error::{MelsealError, Result};

/// Mono audio samples with their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Amplitude samples, nominally in -1.0..1.0
    samples: Vec<f32>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform, rejecting a zero sample rate and non-finite samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        let waveform = Self {
            samples,
            sample_rate,
        };
        waveform.validate()?;
        Ok(waveform)
    }

    /// Create an empty waveform
    pub fn empty(sample_rate: u32) -> Result<Self> {
        Self::new(Vec::new(), sample_rate)
    }

    /// Create a silent waveform with the given duration
    pub fn silence(duration_secs: f64, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f64) as usize;
        Self {
            samples: vec![0.0; num_samples],
            sample_rate,
        }
    }

    /// Create a sine wave test tone
    pub fn sine_wave(frequency: f64, duration_secs: f64, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f64) as usize;
        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
            })
            .collect();

        Self {
            samples,
            sample_rate,
        }
    }

    /// Check the waveform invariants
    ///
    /// # Errors
    /// * `InvalidSampleRate` - If the sample rate is zero
    /// * `NonFiniteSample` - If any sample is NaN or infinite
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MelsealError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        if let Some(index) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(MelsealError::NonFiniteSample { index });
        }
        Ok(())
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get a mutable reference to the samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Consume the waveform, returning its samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the waveform holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Check if waveforms are identical (bit-perfect comparison)
    pub fn is_identical_to(&self, other: &Waveform) -> bool {
        self.sample_rate == other.sample_rate
            && self.samples.len() == other.samples.len()
            && self
                .samples
                .iter()
                .zip(other.samples.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
