//! Session State Machine (C5).

pub mod logger;
pub mod session;
pub mod state;

pub use logger::SessionLogger;
pub use session::{FinalizeRequest, ReducerOutput, Session, SessionInput};
pub use state::SessionState;
