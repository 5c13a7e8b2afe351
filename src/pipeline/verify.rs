//! Verify path
//!
//! Recomputes each segment's features and checks `signatures[i]` against
//! segment `i`. Signatures are matched by position only.

use serde::Serialize;
use tracing::{info, warn};

use crate::crypto::{Signature, Verifier, VerifyOutcome};
use crate::engine::Waveform;
use crate::error::{MelsealError, Result};
use crate::pipeline::config::SignatureCountPolicy;
use crate::pipeline::manifest::SignatureManifest;
use crate::pipeline::runner::SegmentPipeline;
use crate::pipeline::segment::split_segments;

/// Per-segment verification results, ordered by segment index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    outcomes: Vec<VerifyOutcome>,
    segment_length: usize,
}

impl VerificationReport {
    /// One boolean per segment
    pub fn results(&self) -> Vec<bool> {
        self.outcomes.iter().map(VerifyOutcome::is_valid).collect()
    }

    /// Detailed outcome per segment
    pub fn outcomes(&self) -> &[VerifyOutcome] {
        &self.outcomes
    }

    pub fn segment_length(&self) -> usize {
        self.segment_length
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True if every segment verified (vacuously true for no segments)
    pub fn all_valid(&self) -> bool {
        self.outcomes.iter().all(VerifyOutcome::is_valid)
    }

    /// Indices of segments that did not verify
    pub fn failed_segments(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.is_valid())
            .map(|(index, _)| index)
            .collect()
    }
}

impl SegmentPipeline {
    /// Verify every segment of `waveform` against `signatures`
    ///
    /// # Errors
    /// * Configuration errors for an invalid sample rate, segment duration,
    ///   or non-finite samples
    /// * `SignatureCountMismatch` - Under the strict policy, when
    ///   `signatures.len()` differs from the segment count (checked before
    ///   any extraction)
    /// * `Cancelled` - If the pipeline's token fires mid-way
    pub fn verify_segments(
        &self,
        verifier: &Verifier,
        waveform: &Waveform,
        signatures: &[Signature],
    ) -> Result<VerificationReport> {
        let segment_length = self.segment_length_for(waveform)?;
        let sample_rate = waveform.sample_rate();
        let segments = split_segments(waveform.samples(), segment_length);

        if signatures.len() != segments.len() {
            match self.config().count_policy {
                SignatureCountPolicy::Strict => {
                    return Err(MelsealError::SignatureCountMismatch {
                        signatures: signatures.len(),
                        segments: segments.len(),
                    });
                }
                SignatureCountPolicy::BestEffort => warn!(
                    signatures = signatures.len(),
                    segments = segments.len(),
                    "signature count differs from segment count, verifying best effort"
                ),
            }
        }

        info!(
            samples = waveform.len(),
            sample_rate,
            segment_length,
            segments = segments.len(),
            "verifying waveform"
        );

        let outcomes = self.run_segments(&segments, |segment| {
            let Some(signature) = signatures.get(segment.index) else {
                return Ok(VerifyOutcome::Missing);
            };
            let features = self.features(segment, sample_rate);
            Ok(verifier.verify_detailed(signature, &features.to_canonical_bytes()))
        })?;

        for (index, outcome) in outcomes.iter().enumerate() {
            if !outcome.is_valid() {
                warn!(segment = index, ?outcome, "segment failed verification");
            }
        }

        Ok(VerificationReport {
            outcomes,
            segment_length,
        })
    }

    /// Verify `waveform` against the signatures recorded in `manifest`
    ///
    /// The manifest's sample rate, segment length and sample count are
    /// checked against the waveform and this pipeline's config before any
    /// extraction or crypto work.
    ///
    /// # Errors
    /// * `ManifestMismatch` - If the audio or segmentation differ from signing
    /// * `InvalidSignatureEncoding` - If a signature is not valid base64
    /// * Everything [`verify_segments`](Self::verify_segments) returns
    pub fn verify_manifest(
        &self,
        verifier: &Verifier,
        waveform: &Waveform,
        manifest: &SignatureManifest,
    ) -> Result<VerificationReport> {
        manifest.check_compatible(waveform, self.config())?;

        let fingerprint = verifier.fingerprint();
        if fingerprint != manifest.key_fingerprint {
            warn!(
                expected = %manifest.key_fingerprint,
                actual = %fingerprint,
                "public key does not match the manifest's signing key"
            );
        }

        let signatures = manifest.signatures()?;
        self.verify_segments(verifier, waveform, &signatures)
    }
}
