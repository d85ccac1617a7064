//! # Ports
//!
//! Every remote capability the services need, as a trait. Adapters in
//! `api-adapters` and `storage-adapters` implement these; tests use the
//! `MockXxx` types generated when the `testing` feature is on.

use async_trait::async_trait;

use crate::error::{RemoteError, Result};
use crate::models::{
    Comment, CommentId, Credentials, LeaderboardEntry, NewComment, NewThread, Registration, Thread,
    ThreadDetail, ThreadId, User,
};
use crate::session::AccessToken;
use crate::voting::VoteIntent;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Registration, login and user lookups.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn register(&self, registration: &Registration) -> RemoteResult<User>;
    /// Exchanges credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> RemoteResult<AccessToken>;
    /// Resolves the user the token belongs to.
    async fn me(&self, token: &AccessToken) -> RemoteResult<User>;
    async fn list_users(&self) -> RemoteResult<Vec<User>>;
}

/// Thread and comment reads and creations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadGateway: Send + Sync {
    async fn list_threads(&self) -> RemoteResult<Vec<Thread>>;
    async fn get_thread(&self, id: &ThreadId) -> RemoteResult<ThreadDetail>;
    async fn create_thread(&self, token: &AccessToken, thread: &NewThread) -> RemoteResult<Thread>;
    async fn create_comment(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        comment: &NewComment,
    ) -> RemoteResult<Comment>;
}

/// The remote half of a vote. Success means any 2xx; the body is ignored.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VotingGateway: Send + Sync {
    async fn vote_thread(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        intent: VoteIntent,
    ) -> RemoteResult<()>;
    async fn vote_comment(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        comment_id: &CommentId,
        intent: VoteIntent,
    ) -> RemoteResult<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LeaderboardGateway: Send + Sync {
    async fn list_leaderboards(&self) -> RemoteResult<Vec<LeaderboardEntry>>;
}

/// Where the bearer token survives between runs.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<AccessToken>>;
    async fn save(&self, token: &AccessToken) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}
