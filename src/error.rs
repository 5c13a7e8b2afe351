//! Error handling for Melseal
//!
//! Configuration and key errors are fatal and raised before any per-segment
//! work. A segment whose signature does not match is not an error; it is
//! reported as `false` in the verification result.

use thiserror::Error;

/// Result type alias for Melseal operations
pub type Result<T> = std::result::Result<T, MelsealError>;

/// Main error type for Melseal operations
#[derive(Error, Debug)]
pub enum MelsealError {
    // Configuration Errors
    #[error("Invalid sample rate: {sample_rate} Hz (must be > 0)")]
    InvalidSampleRate { sample_rate: u32 },

    #[error("Invalid segment duration: {duration_secs}s (must be finite and > 0)")]
    InvalidSegmentDuration { duration_secs: f64 },

    #[error(
        "Segment duration {duration_secs}s at {sample_rate} Hz yields zero samples per segment"
    )]
    SegmentTooShort { duration_secs: f64, sample_rate: u32 },

    #[error("Signature count mismatch: {signatures} signatures for {segments} segments")]
    SignatureCountMismatch { signatures: usize, segments: usize },

    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    #[error("Manifest does not match input: {reason}")]
    ManifestMismatch { reason: String },

    #[error("Inconsistent manifest: {reason}")]
    InvalidManifest { reason: String },

    #[error("Unsupported feature protocol version: {version} (supported: {supported})")]
    UnsupportedProtocolVersion { version: u32, supported: u32 },

    // Key Errors
    #[error("Key generation failed: {reason}")]
    KeyGeneration {
        reason: String,
        #[source]
        source: Option<rsa::Error>,
    },

    #[error("Invalid key size: {bits} bits (minimum {minimum})")]
    InvalidKeySize { bits: usize, minimum: usize },

    #[error("Invalid public key: {reason}")]
    PublicKey { reason: String },

    #[error("Signing failed: {0}")]
    Signing(#[source] rsa::Error),

    // Pipeline Errors
    #[error("Operation cancelled after {completed} of {total} segments")]
    Cancelled { completed: usize, total: usize },

    // Boundary I/O Errors
    #[error("Failed to read audio file: {path}")]
    AudioRead {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWrite {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Invalid signature encoding at segment {index}: {source}")]
    InvalidSignatureEncoding {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MelsealError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MelsealError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            MelsealError::InvalidSegmentDuration { .. } => "INVALID_SEGMENT_DURATION",
            MelsealError::SegmentTooShort { .. } => "SEGMENT_TOO_SHORT",
            MelsealError::SignatureCountMismatch { .. } => "SIGNATURE_COUNT_MISMATCH",
            MelsealError::NonFiniteSample { .. } => "NON_FINITE_SAMPLE",
            MelsealError::ManifestMismatch { .. } => "MANIFEST_MISMATCH",
            MelsealError::InvalidManifest { .. } => "INVALID_MANIFEST",
            MelsealError::UnsupportedProtocolVersion { .. } => "UNSUPPORTED_PROTOCOL_VERSION",
            MelsealError::KeyGeneration { .. } => "KEY_GENERATION",
            MelsealError::InvalidKeySize { .. } => "INVALID_KEY_SIZE",
            MelsealError::PublicKey { .. } => "PUBLIC_KEY_ERROR",
            MelsealError::Signing(_) => "SIGNING_ERROR",
            MelsealError::Cancelled { .. } => "CANCELLED",
            MelsealError::AudioRead { .. } => "AUDIO_READ_ERROR",
            MelsealError::AudioWrite { .. } => "AUDIO_WRITE_ERROR",
            MelsealError::InvalidSignatureEncoding { .. } => "INVALID_SIGNATURE_ENCODING",
            MelsealError::Io(_) => "IO_ERROR",
            MelsealError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this is a configuration error (caller supplied inconsistent input)
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MelsealError::InvalidSampleRate { .. }
                | MelsealError::InvalidSegmentDuration { .. }
                | MelsealError::SegmentTooShort { .. }
                | MelsealError::SignatureCountMismatch { .. }
                | MelsealError::NonFiniteSample { .. }
                | MelsealError::ManifestMismatch { .. }
                | MelsealError::InvalidManifest { .. }
                | MelsealError::UnsupportedProtocolVersion { .. }
        )
    }

    /// Check if this error concerns key material
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            MelsealError::KeyGeneration { .. }
                | MelsealError::InvalidKeySize { .. }
                | MelsealError::PublicKey { .. }
                | MelsealError::Signing(_)
        )
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::InvalidSampleRate { .. } => "Pass the sample rate reported by the audio decoder",
            Self::InvalidSegmentDuration { .. } | Self::SegmentTooShort { .. } => {
                "Use a segment duration of at least one sample period (default 1.0s)"
            }
            Self::SignatureCountMismatch { .. } => {
                "Verify with the signing segment duration, or use the best-effort policy"
            }
            Self::NonFiniteSample { .. } => "Remove NaN/Inf samples before signing",
            Self::ManifestMismatch { .. } => "Verify the audio the manifest was produced for",
            Self::InvalidManifest { .. } => "Use the manifest written at signing time, unedited",
            Self::PublicKey { .. } => "Pass the PEM public key exported when signing",
            Self::UnsupportedProtocolVersion { .. } => {
                "Re-sign the audio with this version of melseal"
            }
            Self::InvalidKeySize { .. } => "Use a 2048-bit key",
            Self::KeyGeneration { .. } | Self::Signing(_) => "Generate a fresh key pair and retry",
            Self::Cancelled { .. } => "Restart the operation; no partial output was kept",
            Self::AudioRead { .. } => "Check that the file exists and is a valid WAV file",
            _ => "Check the error details and try again",
        }
    }
}
