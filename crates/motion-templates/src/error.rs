//! Template Library error types.

use thiserror::Error;

pub type TemplateResultT<T> = Result<T, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no template for test '{test_name}' model '{model}'")]
    TemplateMissing { test_name: String, model: String },

    #[error("malformed template for test '{test_name}' model '{model}': {reason}")]
    TemplateMalformed {
        test_name: String,
        model: String,
        reason: String,
    },
}
