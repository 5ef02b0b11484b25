//! Error types for identity and permission resolution.

use std::time::Duration;

/// Access resolution errors.
///
/// `NotFound`, `AmbiguousIdentity`, `InvalidInput` and the two permission variants are
/// user-correctable outcomes. Everything else is a failure of a collaborating service.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Empty or malformed input token.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// No identity, subject or descriptor matched.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// More than one identity matched within a single directory lookup.
    #[error("ambiguous identity '{token}': {count} matches for {filter}; specify a more specific identifier")]
    AmbiguousIdentity {
        token: String,
        filter: String,
        count: usize,
    },

    /// Permission value sets a bit outside the namespace's action catalogue.
    #[error("permission '{token}' sets undefined bit(s) {value:#x} (namespace allows {allowed:#x})")]
    UndefinedPermissionBit {
        token: String,
        value: i64,
        allowed: i32,
    },

    /// Textual permission token that names no action in the namespace.
    #[error("unrecognized permission '{token}'")]
    UnrecognizedPermissionToken { token: String },

    /// A collaborating service failed.
    #[error("dependency failure: {message}")]
    DependencyFailure { message: String },

    /// Request rejected by the service (non-retryable 4xx).
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Authentication rejected by the service.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Response body could not be understood.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl AccessError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User-correctable
            Self::InvalidInput { .. } => 1,
            Self::NotFound { .. } => 1,
            Self::AmbiguousIdentity { .. } => 1,
            Self::UndefinedPermissionBit { .. } => 1,
            Self::UnrecognizedPermissionToken { .. } => 1,

            // Config / auth
            Self::Config { .. } => 2,
            Self::Unauthorized { .. } => 2,

            // Dependency
            Self::DependencyFailure { .. } => 3,
            Self::Rejected { .. } => 3,
            Self::RateLimited { .. } => 3,
            Self::InvalidResponse { .. } => 3,
        }
    }

    /// Whether the caller can fix this by changing its input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::NotFound { .. }
                | Self::AmbiguousIdentity { .. }
                | Self::UndefinedPermissionBit { .. }
                | Self::UnrecognizedPermissionToken { .. }
        )
    }

    /// Whether the error originated in a collaborating service.
    pub fn is_dependency_failure(&self) -> bool {
        !self.is_user_correctable() && !matches!(self, Self::Config { .. })
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::DependencyFailure { .. }
        )
    }
}

impl From<reqwest::Error> for AccessError {
    fn from(err: reqwest::Error) -> Self {
        Self::DependencyFailure {
            message: err.to_string(),
        }
    }
}

/// Result type for access resolution.
pub type AccessResult<T> = Result<T, AccessError>;
