//! Feature Extraction
//!
//! Deterministic mel spectrogram transform and the canonical byte encoding
//! that the signer and verifier operate on.

mod features;
mod mel;

pub use features::{FeatureBuffer, FEATURE_VALUE_BYTES};
pub use mel::{
    hz_to_mel, mel_to_hz, MelConfig, MelFilterbank, MelSpectrogram, FEATURE_PROTOCOL_VERSION,
    MAX_CACHED_FILTERBANKS,
};
