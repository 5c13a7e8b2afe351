//! Waveform chunking
//!
//! Segments are contiguous, non-overlapping and in time order. Every segment
//! holds `segment_length` samples except possibly the last. No segment is
//! ever empty, including when the length divides the waveform exactly.

/// A borrowed run of samples with its position in the waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a> {
    /// Position in the segment sequence
    pub index: usize,
    /// Offset of the first sample in the waveform
    pub start: usize,
    /// The samples themselves
    pub samples: &'a [f32],
}

impl Segment<'_> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// `ceil(num_samples / segment_length)`
pub fn segment_count(num_samples: usize, segment_length: usize) -> usize {
    if segment_length == 0 {
        return 0;
    }
    num_samples.div_ceil(segment_length)
}

/// Split `samples` into segments of `segment_length`
///
/// `segment_length` must be non-zero; the pipeline guarantees this through
/// [`PipelineConfig::segment_length`](crate::pipeline::PipelineConfig::segment_length).
pub fn split_segments(samples: &[f32], segment_length: usize) -> Vec<Segment<'_>> {
    debug_assert!(segment_length > 0);
    samples
        .chunks(segment_length.max(1))
        .enumerate()
        .map(|(index, chunk)| Segment {
            index,
            start: index * segment_length,
            samples: chunk,
        })
        .collect()
}
