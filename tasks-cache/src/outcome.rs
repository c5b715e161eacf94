//! Tagged success/failure results from the system of record
//!
//! Record stores never throw through the cache layer. They hand back an
//! [`Outcome`], and only its `Success` arm is ever written to the cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed record operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The addressed record does not exist
    NotFound,
    /// Input failed validation
    Validation,
    /// The write conflicts with existing data
    Conflict,
    /// Any other store-side failure
    Internal,
}

impl FailureKind {
    /// HTTP status code equivalent
    pub fn status_code(&self) -> u16 {
        match self {
            FailureKind::NotFound => 404,
            FailureKind::Validation => 400,
            FailureKind::Conflict => 409,
            FailureKind::Internal => 500,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::Validation => write!(f, "validation"),
            FailureKind::Conflict => write!(f, "conflict"),
            FailureKind::Internal => write!(f, "internal"),
        }
    }
}

/// Failure reported by the underlying record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for OperationFailure {}

/// Result of a record operation with an explicit success/failure tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(OperationFailure),
}

impl<T> Outcome<T> {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Outcome::Failure(OperationFailure {
            kind,
            message: message.into(),
        })
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(FailureKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::failure(FailureKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::failure(FailureKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::failure(FailureKind::Internal, message)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Borrow the success value, if any
    pub fn as_success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }

    pub fn into_result(self) -> Result<T, OperationFailure> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, OperationFailure>> for Outcome<T> {
    fn from(result: Result<T, OperationFailure>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(failure) => Outcome::Failure(failure),
        }
    }
}
