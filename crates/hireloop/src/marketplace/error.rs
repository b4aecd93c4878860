/// Typed failures shared by every marketplace repository.
///
/// Storage text is kept for logs only; the API layer never echoes it to callers.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("owner must be a recruiter account")]
    InvalidOwner,
    #[error("caller does not own this record")]
    Forbidden,
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RepositoryError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Error raised when a label does not belong to a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be one of {allowed}, got '{value}'")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
    pub allowed: &'static str,
}

impl From<UnknownVariant> for RepositoryError {
    fn from(value: UnknownVariant) -> Self {
        Self::InvalidInput(value.to_string())
    }
}
