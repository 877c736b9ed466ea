//! Error taxonomy for the program catalog and enrollment engine.
//!
//! Every fallible core operation returns `Result<_, CoreError>`; nothing
//! panics across an operation boundary. The HTTP layer maps variants to
//! status codes via [`CoreError::status_code`].

use axum::http::StatusCode;
use thiserror::Error;

use crate::model::ProgramStatus;

/// Resource kinds referenced in not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Resource {
    Program,
    Enrollment,
    Quiz,
    Certificate,
    Student,
    Video,
}

/// Persistence-layer failure. Retryable by contract: an operation that
/// surfaces one has not committed any partial state.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// Gate rejection. Carries the full failure list so the caller can
    /// render every problem at once.
    #[error("validation failed: {}", failures.join("; "))]
    Validation { failures: Vec<String> },

    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ProgramStatus,
        to: ProgramStatus,
    },

    #[error(transparent)]
    Store(StoreError),
}

impl CoreError {
    pub fn not_found(resource: Resource, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        CoreError::Conflict(reason.into())
    }

    /// Store unique-key violations are conflicts, not backend failures;
    /// everything else stays a retryable store error.
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(key) => CoreError::Conflict(format!("duplicate key: {key}")),
            other => CoreError::Store(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) | CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CoreError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Store(_))
    }

    /// Category label used as a structured log field.
    pub fn category(&self) -> &'static str {
        match self {
            CoreError::Validation { .. } => "validation_error",
            CoreError::NotFound { .. } => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::InvalidTransition { .. } => "invalid_transition",
            CoreError::Store(_) => "store_error",
        }
    }

    /// Structured failure list for the HTTP error envelope, when present.
    pub fn failures(&self) -> Option<&[String]> {
        match self {
            CoreError::Validation { failures } => Some(failures),
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
