//! Melseal - Per-Segment Audio Tamper Evidence
//!
//! Melseal slices a waveform into fixed-duration segments, derives a
//! deterministic mel power spectrogram for each one, and signs the
//! spectrogram's canonical bytes with RSASSA-PSS. A verifier recomputes the
//! spectrograms from the received audio and reports pass/fail per segment.
//!
//! # Architecture
//!
//! - `dsp`: Feature extractor (mel spectrogram, canonical encoding)
//! - `crypto`: Session key pair, signer, verifier
//! - `pipeline`: Segmentation and the sign/verify paths
//! - `engine`: Waveform type and WAV boundary I/O
//!
//! The audio itself is never modified: the signed waveform equals the input
//! sample-for-sample, with signatures carried alongside.

pub mod cli;
pub mod crypto;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod pipeline;

pub use crypto::{KeyPair, Signature, Signer, Verifier, VerifyOutcome};
pub use dsp::{FeatureBuffer, MelSpectrogram, FEATURE_PROTOCOL_VERSION};
pub use engine::Waveform;
pub use error::{MelsealError, Result};
pub use pipeline::{
    PipelineConfig, SegmentPipeline, SignatureCountPolicy, SignatureManifest, SignedAudio,
    VerificationReport,
};
