//! Template Library (C1).

pub mod cache;
pub mod error;

pub use cache::TemplateLibrary;
pub use error::{TemplateError, TemplateResultT};
