//! Audio Engine Module
//!
//! Boundary types and I/O for the signing pipeline:
//! - Waveform buffer
//! - WAV import/export

pub mod buffer;
pub mod io;

pub use buffer::Waveform;
pub use io::{export_wav, import_wav};
