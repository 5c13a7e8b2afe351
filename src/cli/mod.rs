//! CLI Module
//!
//! Command-line front-end for signing and checking WAV files.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Melseal - per-segment tamper evidence for audio
#[derive(Parser, Debug)]
#[command(name = "melseal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign a WAV file with a fresh session key, then verify it
    #[command(name = "process")]
    Process {
        /// Input WAV file
        input: PathBuf,

        /// Where to write the signed audio
        #[arg(short, long, default_value = "signed_audio.wav")]
        output: PathBuf,

        /// Write the signature manifest here
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Write the session public key (PEM) here
        #[arg(short = 'k', long)]
        public_key: Option<PathBuf>,

        /// Pipeline config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Segment duration in seconds (overrides the config file)
        #[arg(short, long)]
        segment_duration: Option<f64>,

        /// RSA modulus size for the session key
        #[arg(long, default_value_t = crate::crypto::DEFAULT_KEY_BITS)]
        key_bits: usize,
    },

    /// Verify a WAV file against a signature manifest
    #[command(name = "verify")]
    Verify {
        /// Input WAV file
        input: PathBuf,

        /// Signature manifest written at signing time
        #[arg(short, long)]
        manifest: PathBuf,

        /// Public key (PEM) written at signing time
        #[arg(short = 'k', long)]
        public_key: PathBuf,

        /// Pipeline config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Segment duration in seconds (defaults to the manifest's)
        #[arg(short, long)]
        segment_duration: Option<f64>,
    },

    /// Print per-segment feature shapes and digests
    #[command(name = "features")]
    Features {
        /// Input WAV file
        input: PathBuf,

        /// Pipeline config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Segment duration in seconds (overrides the config file)
        #[arg(short, long)]
        segment_duration: Option<f64>,
    },
}
