//! Segment Pipeline
//!
//! Splits a waveform into fixed-duration segments and drives feature
//! extraction plus signing (sign path) or verification (verify path) for
//! each one. Segments are independent, so work runs in parallel while the
//! outputs stay in segment order.

mod cancel;
mod config;
mod manifest;
mod runner;
mod segment;
mod sign;
mod verify;

pub use cancel::CancellationToken;
pub use config::{PipelineConfig, SignatureCountPolicy, DEFAULT_SEGMENT_DURATION_SECS};
pub use manifest::SignatureManifest;
pub use runner::SegmentPipeline;
pub use segment::{segment_count, split_segments, Segment};
pub use sign::SignedAudio;
pub use verify::VerificationReport;
