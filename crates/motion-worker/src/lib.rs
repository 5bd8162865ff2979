//! Bounded CPU-worker pool for the motion assessment backend.
//!
//! Shared by the extraction (C3) and DTW (C4) components so that CPU-bound
//! work for one session never blocks another session's WebSocket task.

pub mod error;
pub mod pool;

pub use error::{WorkerError, WorkerResult};
pub use pool::WorkerPool;
