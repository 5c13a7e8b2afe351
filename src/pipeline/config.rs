//! Pipeline configuration
//!
//! Segment duration has to match between signing and verification; it is
//! never negotiated, so callers carry it alongside the signatures (the
//! manifest does this for the CLI).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MelsealError, Result};

/// Default segment duration in seconds
pub const DEFAULT_SEGMENT_DURATION_SECS: f64 = 1.0;

/// What to do when the signature count differs from the segment count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureCountPolicy {
    /// Reject the call before any work is done
    #[default]
    Strict,
    /// Report unsigned segments as failed and ignore surplus signatures
    BestEffort,
}

/// Configuration shared by the sign and verify paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Segment duration in seconds
    pub segment_duration_secs: f64,
    /// Signature/segment count mismatch handling on the verify path
    pub count_policy: SignatureCountPolicy,
    /// Process segments on the rayon pool
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_duration_secs: DEFAULT_SEGMENT_DURATION_SECS,
            count_policy: SignatureCountPolicy::Strict,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with a custom segment duration
    pub fn with_segment_duration(segment_duration_secs: f64) -> Self {
        Self {
            segment_duration_secs,
            ..Self::default()
        }
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that do not depend on the audio
    pub fn validate(&self) -> Result<()> {
        let d = self.segment_duration_secs;
        if !d.is_finite() || d <= 0.0 {
            return Err(MelsealError::InvalidSegmentDuration { duration_secs: d });
        }
        Ok(())
    }

    /// Samples per segment at `sample_rate`: `floor(duration * rate)`
    ///
    /// # Errors
    /// * `InvalidSampleRate` - If `sample_rate` is zero
    /// * `InvalidSegmentDuration` - If the duration is not positive and finite
    /// * `SegmentTooShort` - If the product rounds down to zero samples
    pub fn segment_length(&self, sample_rate: u32) -> Result<usize> {
        if sample_rate == 0 {
            return Err(MelsealError::InvalidSampleRate { sample_rate });
        }
        self.validate()?;

        let length = (self.segment_duration_secs * sample_rate as f64).floor();
        if length < 1.0 {
            return Err(MelsealError::SegmentTooShort {
                duration_secs: self.segment_duration_secs,
                sample_rate,
            });
        }
        Ok(length as usize)
    }
}
