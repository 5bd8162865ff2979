pub mod dtw;
pub mod health;
pub mod videos;

pub use health::{dtw_health, health, ready};
