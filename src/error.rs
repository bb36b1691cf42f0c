//! Service-level errors.
//!
//! Module errors ([`GatewayError`], [`PersistenceError`], [`CacheError`]) are
//! folded into [`ServiceError`] at the workflow boundary. Every variant carries
//! a stable code and an HTTP status tier so front ends can report failures
//! uniformly.

use http::StatusCode;
use thiserror::Error;

use crate::github::GatewayError;
use crate::persistence::PersistenceError;
use crate::preparation::CacheError;

/// Errors returned by reconciliation, preparation, and the pull request
/// service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// A draft, record, repository, or user does not exist.
    #[error("{message}")]
    NotFound {
        /// What was missing.
        message: String,
    },

    /// The operation would duplicate an existing pull request.
    #[error("{message}")]
    Conflict {
        /// Description of the clash.
        message: String,
    },

    /// GitHub rejected the credentials.
    #[error("{message}")]
    NotAuthorized {
        /// Detail from GitHub.
        message: String,
    },

    /// Required input was missing or inconsistent.
    #[error("{message}")]
    ValidationFailed {
        /// Which input failed.
        message: String,
    },

    /// A GitHub call failed.
    #[error("GitHub request failed: {message}")]
    RemoteApiFailure {
        /// Detail from the gateway.
        message: String,
    },

    /// The local store or draft cache failed.
    #[error("persistence failed: {message}")]
    PersistenceFailure {
        /// Detail from the store.
        message: String,
    },

    /// An internal invariant did not hold.
    #[error("unrecoverable error: {message}")]
    Unrecoverable {
        /// What went wrong.
        message: String,
    },
}

impl ServiceError {
    /// Builds a [`ServiceError::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Builds a [`ServiceError::Conflict`].
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Builds a [`ServiceError::ValidationFailed`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "PRE001",
            Self::Conflict { .. } => "PRE002",
            Self::NotAuthorized { .. } => "PRE003",
            Self::ValidationFailed { .. } => "PRE005",
            Self::RemoteApiFailure { .. } => "PRE006",
            Self::PersistenceFailure { .. } => "PRE007",
            Self::Unrecoverable { .. } => "PRE008",
        }
    }

    /// HTTP status tier for the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotAuthorized { .. } => StatusCode::FORBIDDEN,
            Self::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::RemoteApiFailure { .. } => StatusCode::BAD_GATEWAY,
            Self::PersistenceFailure { .. } | Self::Unrecoverable { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound { .. } => Self::NotFound {
                message: error.to_string(),
            },
            GatewayError::Authentication { .. } | GatewayError::MissingToken => {
                Self::NotAuthorized {
                    message: error.to_string(),
                }
            }
            GatewayError::InvalidUrl(_) | GatewayError::MissingPathSegments => {
                Self::ValidationFailed {
                    message: error.to_string(),
                }
            }
            GatewayError::Api { .. }
            | GatewayError::Network { .. }
            | GatewayError::RateLimitExceeded { .. } => Self::RemoteApiFailure {
                message: error.to_string(),
            },
        }
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(error: PersistenceError) -> Self {
        Self::PersistenceFailure {
            message: error.to_string(),
        }
    }
}

impl From<CacheError> for ServiceError {
    fn from(error: CacheError) -> Self {
        Self::PersistenceFailure {
            message: error.to_string(),
        }
    }
}
