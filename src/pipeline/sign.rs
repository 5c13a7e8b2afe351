//! Sign path
//!
//! Signs each segment's features and rebuilds the waveform from the
//! unmodified segments, so the returned audio equals the input exactly.

use tracing::info;
use uuid::Uuid;

use crate::crypto::{Signature, Signer};
use crate::engine::Waveform;
use crate::error::Result;
use crate::pipeline::runner::SegmentPipeline;
use crate::pipeline::segment::split_segments;

/// Output of one sign operation
#[derive(Debug, Clone)]
pub struct SignedAudio {
    /// Identifies this signing session
    pub session_id: Uuid,
    /// Reassembled waveform, sample-for-sample equal to the input
    pub waveform: Waveform,
    /// One signature per segment, by index
    pub signatures: Vec<Signature>,
    /// Samples per (full) segment
    pub segment_length: usize,
}

impl SignedAudio {
    pub fn num_segments(&self) -> usize {
        self.signatures.len()
    }

    pub fn into_parts(self) -> (Waveform, Vec<Signature>) {
        (self.waveform, self.signatures)
    }
}

impl SegmentPipeline {
    /// Sign every segment of `waveform` and reassemble it
    ///
    /// # Errors
    /// * Configuration errors for an invalid sample rate, segment duration,
    ///   or non-finite samples, raised before any signing
    /// * `Signing` - If the key cannot sign; no partial output is returned
    /// * `Cancelled` - If the pipeline's token fires mid-way
    pub fn sign_and_reconstruct(
        &self,
        signer: &Signer,
        waveform: &Waveform,
    ) -> Result<SignedAudio> {
        let segment_length = self.segment_length_for(waveform)?;
        let sample_rate = waveform.sample_rate();
        let segments = split_segments(waveform.samples(), segment_length);

        info!(
            samples = waveform.len(),
            sample_rate,
            segment_length,
            segments = segments.len(),
            "signing waveform"
        );

        let signatures = self.run_segments(&segments, |segment| {
            let features = self.features(segment, sample_rate);
            signer.sign(&features.to_canonical_bytes())
        })?;

        let mut reconstructed = Vec::with_capacity(waveform.len());
        for segment in &segments {
            reconstructed.extend_from_slice(segment.samples);
        }

        Ok(SignedAudio {
            session_id: Uuid::new_v4(),
            waveform: Waveform::new(reconstructed, sample_rate)?,
            signatures,
            segment_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyPair, MIN_KEY_BITS};
    use crate::error::MelsealError;
    use crate::pipeline::{CancellationToken, PipelineConfig};

    fn signer() -> Signer {
        Signer::new(&KeyPair::generate_with_bits(MIN_KEY_BITS).unwrap())
    }

    #[test]
    fn test_reconstruction_is_identical() {
        let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
        let waveform = Waveform::sine_wave(440.0, 2.3, 8000);

        let signed = pipeline.sign_and_reconstruct(&signer(), &waveform).unwrap();

        assert!(signed.waveform.is_identical_to(&waveform));
        assert_eq!(signed.num_segments(), 3);
        assert_eq!(signed.segment_length, 8000);
    }

    #[test]
    fn test_empty_waveform_yields_no_signatures() {
        let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
        let waveform = Waveform::empty(16000).unwrap();

        let signed = pipeline.sign_and_reconstruct(&signer(), &waveform).unwrap();
        assert!(signed.signatures.is_empty());
        assert!(signed.waveform.is_empty());
    }

    #[test]
    fn test_non_finite_input_rejected_before_signing() {
        let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
        let mut waveform = Waveform::sine_wave(440.0, 1.0, 8000);
        waveform.samples_mut()[100] = f32::INFINITY;

        let result = pipeline.sign_and_reconstruct(&signer(), &waveform);
        assert!(matches!(
            result,
            Err(MelsealError::NonFiniteSample { index: 100 })
        ));
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
        let waveform = Waveform::sine_wave(440.0, 0.5, 8000);
        let signer = signer();

        let a = pipeline.sign_and_reconstruct(&signer, &waveform).unwrap();
        let b = pipeline.sign_and_reconstruct(&signer, &waveform).unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_cancelled_signing_returns_no_signatures() {
        let token = CancellationToken::new();
        let pipeline = SegmentPipeline::new(PipelineConfig::default())
            .unwrap()
            .with_cancellation(token.clone());
        token.cancel();

        let waveform = Waveform::sine_wave(440.0, 3.0, 8000);
        let result = pipeline.sign_and_reconstruct(&signer(), &waveform);
        assert!(matches!(
            result,
            Err(MelsealError::Cancelled {
                completed: 0,
                total: 3
            })
        ));
    }
}
