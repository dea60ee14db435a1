mod fetch;

use thiserror::Error;

pub use fetch::FetchError;

#[derive(Error, Debug)]
pub enum InterrogatorError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Kind mismatch: cannot compare {left} with {right}")]
    KindMismatch { left: String, right: String },

    #[error("Unsupported format: '{0}' (expected table, json or csv)")]
    UnsupportedFormat(String),

    #[error("Unrenderable mixed shape: {0}")]
    UnrenderableMixedShape(String),

    #[error("Unknown resource kind: '{0}' (expected one of {kinds})", kinds = crate::resource::ResourceKind::names())]
    UnknownKind(String),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, InterrogatorError>;
