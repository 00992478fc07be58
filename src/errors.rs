//! Error types for the persistence layer.

use std::fmt;

use thiserror::Error;

use crate::store::{CancelCode, StoreError};

/// The entity family a repository error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Project,
    Department,
    Expense,
    Advance,
    Image,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Project => "project",
            EntityKind::Department => "department",
            EntityKind::Expense => "expense",
            EntityKind::Advance => "advance",
            EntityKind::Image => "image metadata",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the repositories.
///
/// `NotFound` and `AlreadyExists` carry the entity they refer to so the service
/// layer can map them to its error codes without string matching.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(EntityKind),

    #[error("{0} already exists")]
    AlreadyExists(EntityKind),

    /// The backend shed load; safe to retry after a pause.
    #[error("data store throttled the request: {0}")]
    Throttled(String),

    #[error("data store request failed: {0}")]
    Internal(String),
}

impl From<StoreError> for RepoError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Throttled(message) => RepoError::Throttled(message),
            StoreError::TransactionCanceled { reasons } => {
                if reasons.contains(&CancelCode::Throttled) {
                    RepoError::Throttled("transaction canceled by throttling".to_string())
                } else {
                    RepoError::Internal(format!("transaction canceled: {reasons:?}"))
                }
            }
            other => RepoError::Internal(other.to_string()),
        }
    }
}
