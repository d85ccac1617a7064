//! # AppError
//!
//! Centralized error handling for rusty-forum.
//! `RemoteError` is what ports return; `AppError` is what services surface.

use thiserror::Error;

use crate::voting::VoteTarget;

/// Failure reported by a remote gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The API answered with a non-2xx status.
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (DNS, connect, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected envelope.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The call did not complete within the configured deadline.
    #[error("request timed out")]
    Timeout,
}

impl RemoteError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Status { status: 401, .. })
    }
}

/// The primary error type for all service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// An operation that needs a session was attempted without one.
    #[error("authentication required")]
    Unauthenticated,

    /// The remote vote call failed; the optimistic change was already reverted.
    #[error("vote on {target} failed: {source}")]
    RemoteVoteFailed {
        target: VoteTarget,
        #[source]
        source: RemoteError,
    },

    /// Fetching `resource` failed; local state was left untouched.
    #[error("failed to fetch {resource}: {source}")]
    RemoteFetchFailed {
        resource: String,
        #[source]
        source: RemoteError,
    },

    /// Any other remote call (login, register, create) failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Resource not held locally (e.g. voting on a comment of a closed thread)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Input rejected before any network call.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The token store could not be read or written.
    #[error("session storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn fetch(resource: impl Into<String>) -> impl FnOnce(RemoteError) -> AppError {
        let resource = resource.into();
        move |source| AppError::RemoteFetchFailed { resource, source }
    }
}

/// A specialized Result type for rusty-forum logic.
pub type Result<T> = std::result::Result<T, AppError>;
