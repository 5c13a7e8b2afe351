//! Segment pipeline core
//!
//! Holds the extractor and configuration, validates inputs, and fans
//! per-segment work out over the rayon pool. Output order always follows
//! segment index, whatever order workers finish in.

use rayon::prelude::*;
use tracing::debug;

use crate::dsp::{FeatureBuffer, MelSpectrogram};
use crate::engine::Waveform;
use crate::error::{MelsealError, Result};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::segment::{split_segments, Segment};

/// Orchestrates segmentation, extraction, signing and verification
#[derive(Debug)]
pub struct SegmentPipeline {
    config: PipelineConfig,
    extractor: MelSpectrogram,
    cancellation: Option<CancellationToken>,
}

impl SegmentPipeline {
    /// Create a pipeline with the pinned protocol extractor
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: MelSpectrogram::protocol_v1(),
            cancellation: None,
        })
    }

    /// Attach a cancellation token checked before each segment
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extractor(&self) -> &MelSpectrogram {
        &self.extractor
    }

    /// Validate `waveform` and return its segment length
    pub fn segment_length_for(&self, waveform: &Waveform) -> Result<usize> {
        waveform.validate()?;
        self.config.segment_length(waveform.sample_rate())
    }

    /// Feature buffer of every segment, in order
    pub fn extract_features(&self, waveform: &Waveform) -> Result<Vec<FeatureBuffer>> {
        let segment_length = self.segment_length_for(waveform)?;
        let segments = split_segments(waveform.samples(), segment_length);
        self.run_segments(&segments, |segment| Ok(self.features(segment, waveform.sample_rate())))
    }

    pub(crate) fn features(&self, segment: &Segment<'_>, sample_rate: u32) -> FeatureBuffer {
        let features = self.extractor.extract(segment.samples, sample_rate);
        debug!(
            segment = segment.index,
            samples = segment.len(),
            frames = features.n_frames(),
            "extracted features"
        );
        features
    }

    /// Run `work` once per segment and collect results by index
    ///
    /// The first error aborts the call. If the cancellation token fires,
    /// segments not yet started are skipped and the call fails with
    /// `Cancelled`.
    pub(crate) fn run_segments<T, F>(&self, segments: &[Segment<'_>], work: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&Segment<'_>) -> Result<T> + Sync,
    {
        let step = |segment: &Segment<'_>| -> Result<Option<T>> {
            if self.is_cancelled() {
                return Ok(None);
            }
            work(segment).map(Some)
        };

        let slots: Vec<Option<T>> = if self.config.parallel {
            segments.par_iter().map(step).collect::<Result<_>>()?
        } else {
            segments.iter().map(step).collect::<Result<_>>()?
        };

        let completed = slots.iter().filter(|slot| slot.is_some()).count();
        if completed < slots.len() {
            return Err(MelsealError::Cancelled {
                completed,
                total: slots.len(),
            });
        }
        Ok(slots.into_iter().flatten().collect())
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
