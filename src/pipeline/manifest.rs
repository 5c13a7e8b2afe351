//! Signature manifest
//!
//! JSON sidecar carrying everything a verifier needs besides the audio and
//! the public key: protocol version, segmentation parameters, and the
//! base64 signatures in segment order.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::Signature;
use crate::dsp::FEATURE_PROTOCOL_VERSION;
use crate::engine::Waveform;
use crate::error::{MelsealError, Result};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::segment::segment_count;
use crate::pipeline::sign::SignedAudio;

/// Serializable record of one signing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureManifest {
    /// Feature transform and encoding version
    pub protocol_version: u32,
    /// Signing session these signatures belong to
    pub session_id: Uuid,
    /// When the audio was signed
    pub created_at: DateTime<Utc>,
    /// SHA-256 fingerprint of the signing public key
    pub key_fingerprint: String,
    /// Sample rate the audio was signed at
    pub sample_rate: u32,
    /// Segment duration used for signing
    pub segment_duration_secs: f64,
    /// Samples per full segment
    pub segment_length: usize,
    /// Total samples in the signed waveform
    pub num_samples: usize,
    /// Base64 signatures, one per segment
    pub signatures: Vec<String>,
}

impl SignatureManifest {
    /// Build a manifest for `signed`
    pub fn new(signed: &SignedAudio, config: &PipelineConfig, key_fingerprint: &str) -> Self {
        Self {
            protocol_version: FEATURE_PROTOCOL_VERSION,
            session_id: signed.session_id,
            created_at: Utc::now(),
            key_fingerprint: key_fingerprint.to_string(),
            sample_rate: signed.waveform.sample_rate(),
            segment_duration_secs: config.segment_duration_secs,
            segment_length: signed.segment_length,
            num_samples: signed.waveform.len(),
            signatures: signed.signatures.iter().map(Signature::to_base64).collect(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON, rejecting unknown protocol versions and inconsistent fields
    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the manifest against itself
    ///
    /// # Errors
    /// * `UnsupportedProtocolVersion` - If written by another feature protocol
    /// * `InvalidManifest` - If `segment_length` does not follow from the
    ///   duration and rate, or the signature count does not cover `num_samples`
    pub fn validate(&self) -> Result<()> {
        if self.protocol_version != FEATURE_PROTOCOL_VERSION {
            return Err(MelsealError::UnsupportedProtocolVersion {
                version: self.protocol_version,
                supported: FEATURE_PROTOCOL_VERSION,
            });
        }

        let expected_length = PipelineConfig::with_segment_duration(self.segment_duration_secs)
            .segment_length(self.sample_rate)?;
        if self.segment_length != expected_length {
            return Err(MelsealError::InvalidManifest {
                reason: format!(
                    "segment_length {} but {}s at {} Hz gives {}",
                    self.segment_length,
                    self.segment_duration_secs,
                    self.sample_rate,
                    expected_length
                ),
            });
        }

        let expected_count = segment_count(self.num_samples, self.segment_length);
        if self.signatures.len() != expected_count {
            return Err(MelsealError::InvalidManifest {
                reason: format!(
                    "{} signatures for {} samples in segments of {}",
                    self.signatures.len(),
                    self.num_samples,
                    self.segment_length
                ),
            });
        }
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Decode the signatures
    pub fn signatures(&self) -> Result<Vec<Signature>> {
        self.signatures
            .iter()
            .enumerate()
            .map(|(index, encoded)| {
                Signature::from_base64(encoded)
                    .map_err(|source| MelsealError::InvalidSignatureEncoding { index, source })
            })
            .collect()
    }

    /// Pipeline config that segments audio the way the signer did
    pub fn pipeline_config(&self, base: &PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            segment_duration_secs: self.segment_duration_secs,
            ..base.clone()
        }
    }

    /// Check that `waveform` and `config` line up with this manifest
    ///
    /// Segmentation is compared by segment length in samples, so durations
    /// that floor to the same length are compatible.
    ///
    /// # Errors
    /// * `ManifestMismatch` - On a differing sample rate, segment length,
    ///   or sample count
    pub fn check_compatible(&self, waveform: &Waveform, config: &PipelineConfig) -> Result<()> {
        if waveform.sample_rate() != self.sample_rate {
            return Err(MelsealError::ManifestMismatch {
                reason: format!(
                    "sample rate {} Hz, manifest was signed at {} Hz",
                    waveform.sample_rate(),
                    self.sample_rate
                ),
            });
        }
        let segment_length = config.segment_length(self.sample_rate)?;
        if segment_length != self.segment_length {
            return Err(MelsealError::ManifestMismatch {
                reason: format!(
                    "segment duration {}s gives {} samples, manifest uses {} ({}s)",
                    config.segment_duration_secs,
                    segment_length,
                    self.segment_length,
                    self.segment_duration_secs
                ),
            });
        }
        if waveform.len() != self.num_samples {
            return Err(MelsealError::ManifestMismatch {
                reason: format!(
                    "{} samples, manifest covers {}",
                    waveform.len(),
                    self.num_samples
                ),
            });
        }
        Ok(())
    }
}
