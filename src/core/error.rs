use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtelierError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Contagion violation [{rule}] {path}: {message}")]
    ContagionViolation {
        rule: String,
        path: String,
        message: String,
    },
    #[error("Not found: {0}")]
    NotFound(String),
}
