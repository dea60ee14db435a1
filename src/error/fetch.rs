use thiserror::Error;

/// Failure reported by a [`ResourceClient`](crate::resource::ResourceClient).
///
/// These originate outside the core and are passed through unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        FetchError::NotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
