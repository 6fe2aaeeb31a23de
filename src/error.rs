// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DbPoolError;

/// Errors surfaced by the feed and engagement operations
#[derive(Debug, Error)]
pub enum SocialError {
    /// The operation needs a caller identity and none was supplied
    #[error("authentication required")]
    AuthenticationRequired,

    /// A referenced post, comment or user does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The caller is authenticated but does not own the resource
    #[error("not authorized to modify {0}")]
    Unauthorized(String),

    /// A storage-level uniqueness constraint rejected the write
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Malformed input such as empty content or a negative page size
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Database or pool failure
    #[error("storage error: {0}")]
    Storage(String),
}

/// Stable, serializable classification of a [`SocialError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthenticationRequired,
    NotFound,
    Unauthorized,
    ConstraintViolation,
    ValidationError,
    Internal,
}

impl SocialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SocialError::AuthenticationRequired => ErrorKind::AuthenticationRequired,
            SocialError::NotFound(_) => ErrorKind::NotFound,
            SocialError::Unauthorized(_) => ErrorKind::Unauthorized,
            SocialError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            SocialError::ValidationError(_) => ErrorKind::ValidationError,
            SocialError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        SocialError::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        SocialError::ValidationError(message.into())
    }
}

impl From<DieselError> for SocialError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => SocialError::NotFound("record".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                SocialError::ConstraintViolation(info.message().to_string())
            }
            // A referenced row vanished between our check and the write
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                SocialError::NotFound(format!(
                    "row referenced by {}",
                    info.table_name().unwrap_or("the write")
                ))
            }
            other => SocialError::Storage(other.to_string()),
        }
    }
}

impl From<DbPoolError> for SocialError {
    fn from(err: DbPoolError) -> Self {
        SocialError::Storage(format!("Failed to get database connection: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, SocialError>;
