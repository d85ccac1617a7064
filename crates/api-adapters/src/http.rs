//! # HttpForumApi
//!
//! `reqwest` client for the forum REST API. One value implements every
//! gateway port so the composition root can share a connection pool.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use domains::{
    AccessToken, AuthGateway, Comment, CommentId, Credentials, LeaderboardEntry,
    LeaderboardGateway, NewComment, NewThread, Registration, RemoteError, RemoteResult, Thread,
    ThreadDetail, ThreadGateway, ThreadId, User, VoteIntent, VotingGateway,
};

use crate::wire::{
    failure_message, CommentData, DetailData, Envelope, LeaderboardsData, ThreadData, ThreadsData,
    TokenData, UserData, UsersData,
};

#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Whole-request deadline applied by the HTTP client.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            user_agent: format!("rusty-forum/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpForumApi {
    client: Client,
    base_url: String,
}

impl HttpForumApi {
    pub fn new(base_url: impl Into<String>, options: HttpOptions) -> RemoteResult<Self> {
        let mut builder = Client::builder().user_agent(options.user_agent);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Sends the request and decodes the envelope's `data`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        name: &str,
        request: RequestBuilder,
    ) -> RemoteResult<T> {
        let response = Self::check_response(name, request.send().await.map_err(transport)?).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("{name}: {e}")))?;
        Ok(envelope.data)
    }

    /// Sends the request; any 2xx is success and the body is ignored.
    async fn execute(&self, name: &str, request: RequestBuilder) -> RemoteResult<()> {
        Self::check_response(name, request.send().await.map_err(transport)?).await?;
        Ok(())
    }

    async fn check_response(name: &str, response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            debug!(request = name, %status, "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = failure_message(&body);
        debug!(request = name, %status, %message, "request failed");
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

fn transport(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout
    } else if error.is_decode() {
        RemoteError::Decode(error.to_string())
    } else {
        RemoteError::Transport(error.to_string())
    }
}

#[async_trait]
impl AuthGateway for HttpForumApi {
    #[instrument(skip_all, fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> RemoteResult<User> {
        let data: UserData = self
            .fetch("register", self.post("/register").json(registration))
            .await?;
        Ok(data.user)
    }

    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> RemoteResult<AccessToken> {
        let data: TokenData = self.fetch("login", self.post("/login").json(credentials)).await?;
        Ok(AccessToken::new(data.token))
    }

    #[instrument(skip_all)]
    async fn me(&self, token: &AccessToken) -> RemoteResult<User> {
        let request = self.get("/users/me").bearer_auth(token.expose());
        let data: UserData = self.fetch("me", request).await?;
        Ok(data.user)
    }

    #[instrument(skip_all)]
    async fn list_users(&self) -> RemoteResult<Vec<User>> {
        let data: UsersData = self.fetch("list_users", self.get("/users")).await?;
        Ok(data.users)
    }
}

#[async_trait]
impl ThreadGateway for HttpForumApi {
    #[instrument(skip_all)]
    async fn list_threads(&self) -> RemoteResult<Vec<Thread>> {
        let data: ThreadsData = self.fetch("list_threads", self.get("/threads")).await?;
        Ok(data.threads)
    }

    #[instrument(skip_all, fields(thread = %id))]
    async fn get_thread(&self, id: &ThreadId) -> RemoteResult<ThreadDetail> {
        let data: DetailData = self
            .fetch("get_thread", self.get(&format!("/threads/{id}")))
            .await?;
        Ok(data.detail_thread)
    }

    #[instrument(skip_all)]
    async fn create_thread(&self, token: &AccessToken, thread: &NewThread) -> RemoteResult<Thread> {
        let request = self.post("/threads").bearer_auth(token.expose()).json(thread);
        let data: ThreadData = self.fetch("create_thread", request).await?;
        Ok(data.thread)
    }

    #[instrument(skip_all, fields(thread = %thread_id))]
    async fn create_comment(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        comment: &NewComment,
    ) -> RemoteResult<Comment> {
        let request = self
            .post(&format!("/threads/{thread_id}/comments"))
            .bearer_auth(token.expose())
            .json(comment);
        let data: CommentData = self.fetch("create_comment", request).await?;
        Ok(data.comment)
    }
}

#[async_trait]
impl VotingGateway for HttpForumApi {
    #[instrument(skip_all, fields(thread = %thread_id, %intent))]
    async fn vote_thread(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        intent: VoteIntent,
    ) -> RemoteResult<()> {
        let request = self
            .post(&format!("/threads/{thread_id}/{intent}-vote"))
            .bearer_auth(token.expose());
        self.execute("vote_thread", request).await
    }

    #[instrument(skip_all, fields(thread = %thread_id, comment = %comment_id, %intent))]
    async fn vote_comment(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        comment_id: &CommentId,
        intent: VoteIntent,
    ) -> RemoteResult<()> {
        let request = self
            .post(&format!("/threads/{thread_id}/comments/{comment_id}/{intent}-vote"))
            .bearer_auth(token.expose());
        self.execute("vote_comment", request).await
    }
}

#[async_trait]
impl LeaderboardGateway for HttpForumApi {
    #[instrument(skip_all)]
    async fn list_leaderboards(&self) -> RemoteResult<Vec<LeaderboardEntry>> {
        let data: LeaderboardsData = self
            .fetch("list_leaderboards", self.get("/leaderboards"))
            .await?;
        Ok(data.leaderboards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = HttpForumApi::new("http://localhost:3000/v1/", HttpOptions::default()).unwrap();
        assert_eq!(api.base_url(), "http://localhost:3000/v1");
        assert_eq!(api.url("/threads"), "http://localhost:3000/v1/threads");
    }
}
