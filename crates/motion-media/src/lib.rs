#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the Recording Writer (C7).
//!
//! This crate provides:
//! - Type-safe FFmpeg command building (`command`)
//! - Progress parsing from `-progress pipe:2` (`progress`)
//! - Encoding the per-session frame buffer to a single MP4 (`recording`)

pub mod command;
pub mod error;
pub mod progress;
pub mod recording;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use recording::write_mp4;
