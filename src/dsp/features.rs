//! Feature buffer and its canonical byte encoding
//!
//! The canonical bytes are what actually gets signed, so the layout is part
//! of the protocol: mel-band-major (row = mel band, column = frame), each
//! value an IEEE-754 binary32 in little-endian byte order.

use sha2::{Digest, Sha256};

/// Bytes per encoded feature value
pub const FEATURE_VALUE_BYTES: usize = 4;

/// Mel power spectrogram of one segment, `n_mels x n_frames`, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBuffer {
    data: Vec<f32>,
    n_mels: usize,
    n_frames: usize,
}

impl FeatureBuffer {
    pub(crate) fn new(data: Vec<f32>, n_mels: usize, n_frames: usize) -> Self {
        debug_assert_eq!(data.len(), n_mels * n_frames);
        Self {
            data,
            n_mels,
            n_frames,
        }
    }

    /// Number of mel bands (rows)
    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    /// Number of time frames (columns)
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Power value at `(mel, frame)`
    pub fn get(&self, mel: usize, frame: usize) -> Option<f32> {
        if mel < self.n_mels && frame < self.n_frames {
            Some(self.data[mel * self.n_frames + frame])
        } else {
            None
        }
    }

    /// Row-major values
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// One mel band across all frames
    pub fn band(&self, mel: usize) -> Option<&[f32]> {
        let start = mel.checked_mul(self.n_frames)?;
        self.data.get(start..start + self.n_frames)
    }

    /// Encode to the canonical signed payload
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * FEATURE_VALUE_BYTES);
        for value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// SHA-256 of the canonical bytes, hex encoded
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.to_canonical_bytes()))
    }

    /// Largest power value (0.0 for an all-zero buffer)
    pub fn max_power(&self) -> f32 {
        self.data.iter().copied().fold(0.0_f32, f32::max)
    }

    /// Convert power to decibels relative to the buffer maximum
    ///
    /// `10 * log10(max(p, amin) / max(ref, amin))`, floored at `max - top_db`
    /// when `top_db` is given.
    pub fn power_to_db(&self, top_db: Option<f32>) -> Vec<f32> {
        const AMIN: f32 = 1e-10;
        let reference = self.max_power().max(AMIN);
        let mut db: Vec<f32> = self
            .data
            .iter()
            .map(|&p| 10.0 * (p.max(AMIN) / reference).log10())
            .collect();

        if let Some(top_db) = top_db {
            let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let floor = peak - top_db;
            for v in &mut db {
                *v = v.max(floor);
            }
        }
        db
    }
}
