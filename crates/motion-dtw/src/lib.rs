//! DTW Engine (C4): alignment between a live feature sequence and a
//! reference template, under an optional Sakoe-Chiba band.

pub mod band;
pub mod dtw;
pub mod error;

pub use band::Band;
pub use dtw::{aligned_ref_by_live, dtw, DtwOutcome};
pub use error::{DtwError, DtwResultT};
