//! # integration-tests
//!
//! An in-memory forum server behind the gateway ports, plus builders.
//! Vote calls can be held open and resolved by the test in any order.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use tokio::sync::{mpsc, oneshot, Mutex};

use domains::{
    AccessToken, AuthGateway, Comment, CommentId, Credentials, LeaderboardEntry,
    LeaderboardGateway, NewComment, NewThread, Registration, RemoteError, RemoteResult, Thread,
    ThreadDetail, ThreadGateway, ThreadId, User, UserId, VoteIntent, VoterSet, VotingGateway,
};
use services::{ForumClient, Gateways, VotingOptions};
use storage_adapters::MemoryTokenStore;

/// A vote call waiting for the test to answer it.
pub struct HeldVote {
    pub call: String,
    reply: oneshot::Sender<RemoteResult<()>>,
}

impl HeldVote {
    pub fn accept(self) {
        let _ = self.reply.send(Ok(()));
    }

    pub fn reject(self, error: RemoteError) {
        let _ = self.reply.send(Err(error));
    }
}

#[derive(Default)]
struct Server {
    threads: Vec<Thread>,
    details: Vec<ThreadDetail>,
    accounts: Vec<(User, String)>,
    leaderboards: Vec<LeaderboardEntry>,
    vote_replies: VecDeque<RemoteResult<()>>,
    calls: Vec<String>,
    next_id: u32,
}

impl Server {
    fn user_of(&self, token: &AccessToken) -> RemoteResult<User> {
        self.accounts
            .iter()
            .map(|(user, _)| user)
            .find(|user| token_for(&user.id) == token.expose())
            .cloned()
            .ok_or_else(|| status(401, "token is invalid"))
    }

    fn votes_of(
        &mut self,
        thread_id: &ThreadId,
        comment_id: Option<&CommentId>,
    ) -> Vec<&mut VoterSet> {
        let mut sets = Vec::new();
        match comment_id {
            None => {
                if let Some(thread) = self.threads.iter_mut().find(|t| &t.id == thread_id) {
                    sets.push(&mut thread.votes);
                }
                if let Some(detail) = self.details.iter_mut().find(|d| &d.id == thread_id) {
                    sets.push(&mut detail.votes);
                }
            }
            Some(comment_id) => {
                if let Some(comment) = self
                    .details
                    .iter_mut()
                    .find(|d| &d.id == thread_id)
                    .and_then(|d| d.comments.iter_mut().find(|c| &c.id == comment_id))
                {
                    sets.push(&mut comment.votes);
                }
            }
        }
        sets
    }
}

/// Stands in for the forum REST API. Accounts log in with `token-{user id}`.
pub struct FakeForumApi {
    server: Mutex<Server>,
    hold: Option<mpsc::UnboundedSender<HeldVote>>,
}

impl FakeForumApi {
    pub fn new() -> Self {
        Self {
            server: Mutex::new(Server::default()),
            hold: None,
        }
    }

    /// Every vote call is handed to the returned receiver and waits there.
    pub fn holding_votes() -> (Self, mpsc::UnboundedReceiver<HeldVote>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = Self {
            server: Mutex::new(Server::default()),
            hold: Some(tx),
        };
        (api, rx)
    }

    /// Adds `thread` to the list and serves a matching detail with `comments`.
    pub fn with_thread(mut self, thread: Thread, comments: Vec<Comment>) -> Self {
        let server = self.server.get_mut();
        let mut detail = detail_of(&thread);
        detail.comments = comments;
        server.details.push(detail);
        server.threads.push(thread);
        self
    }

    pub fn with_account(mut self, user: User, password: &str) -> Self {
        self.server.get_mut().accounts.push((user, password.to_string()));
        self
    }

    pub fn with_leaderboards(mut self, entries: Vec<LeaderboardEntry>) -> Self {
        self.server.get_mut().leaderboards = entries;
        self
    }

    /// Answers the next unheld vote call with `reply` instead of success.
    pub async fn reply_next_vote(&self, reply: RemoteResult<()>) {
        self.server.lock().await.vote_replies.push_back(reply);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.server.lock().await.calls.clone()
    }

    pub async fn vote_calls(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| call.starts_with("vote"))
            .collect()
    }

    /// Server-side voters of a thread.
    pub async fn thread_votes(&self, thread_id: &str) -> Option<VoterSet> {
        let server = self.server.lock().await;
        server
            .threads
            .iter()
            .find(|t| t.id.as_str() == thread_id)
            .map(|t| t.votes.clone())
    }

    async fn record(&self, call: String) {
        self.server.lock().await.calls.push(call);
    }

    async fn vote(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        comment_id: Option<&CommentId>,
        intent: VoteIntent,
    ) -> RemoteResult<()> {
        let call = match comment_id {
            None => format!("vote_thread {thread_id} {intent}"),
            Some(comment_id) => format!("vote_comment {thread_id}/{comment_id} {intent}"),
        };
        self.record(call.clone()).await;
        let user = self.server.lock().await.user_of(token)?;

        let reply = match &self.hold {
            Some(hold) => {
                let (reply, answer) = oneshot::channel();
                hold.send(HeldVote { call, reply })
                    .map_err(|_| RemoteError::Transport("vote receiver dropped".to_string()))?;
                answer.await.unwrap_or_else(|_| {
                    Err(RemoteError::Transport("vote was never answered".to_string()))
                })
            }
            None => self.server.lock().await.vote_replies.pop_front().unwrap_or(Ok(())),
        };
        reply?;

        let mut server = self.server.lock().await;
        let sets = server.votes_of(thread_id, comment_id);
        if sets.is_empty() {
            return Err(status(404, "vote target not found"));
        }
        for votes in sets {
            apply_intent(votes, &user.id, intent);
        }
        Ok(())
    }
}

impl Default for FakeForumApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for FakeForumApi {
    async fn register(&self, registration: &Registration) -> RemoteResult<User> {
        self.record(format!("register {}", registration.email)).await;
        let mut server = self.server.lock().await;
        if server.accounts.iter().any(|(u, _)| u.email == registration.email) {
            return Err(status(400, "email is already taken"));
        }
        server.next_id += 1;
        let user = User {
            id: UserId::new(format!("user-{}", server.next_id)),
            name: registration.name.clone(),
            email: registration.email.clone(),
            avatar: None,
        };
        let password = registration.password.expose_secret().to_string();
        server.accounts.push((user.clone(), password));
        Ok(user)
    }

    async fn login(&self, credentials: &Credentials) -> RemoteResult<AccessToken> {
        self.record(format!("login {}", credentials.email)).await;
        let server = self.server.lock().await;
        server
            .accounts
            .iter()
            .find(|(user, password)| {
                user.email == credentials.email
                    && password.as_str() == credentials.password.expose_secret()
            })
            .map(|(user, _)| AccessToken::new(token_for(&user.id)))
            .ok_or_else(|| status(401, "email or password is wrong"))
    }

    async fn me(&self, token: &AccessToken) -> RemoteResult<User> {
        self.record("me".to_string()).await;
        self.server.lock().await.user_of(token)
    }

    async fn list_users(&self) -> RemoteResult<Vec<User>> {
        self.record("list_users".to_string()).await;
        let server = self.server.lock().await;
        Ok(server.accounts.iter().map(|(user, _)| user.clone()).collect())
    }
}

#[async_trait]
impl ThreadGateway for FakeForumApi {
    async fn list_threads(&self) -> RemoteResult<Vec<Thread>> {
        self.record("list_threads".to_string()).await;
        Ok(self.server.lock().await.threads.clone())
    }

    async fn get_thread(&self, id: &ThreadId) -> RemoteResult<ThreadDetail> {
        self.record(format!("get_thread {id}")).await;
        let server = self.server.lock().await;
        server
            .details
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| status(404, "thread not found"))
    }

    async fn create_thread(&self, token: &AccessToken, thread: &NewThread) -> RemoteResult<Thread> {
        self.record(format!("create_thread {}", thread.title)).await;
        let mut server = self.server.lock().await;
        let owner = server.user_of(token)?;
        server.next_id += 1;

        let created = Thread {
            id: ThreadId::new(format!("thread-{}", server.next_id)),
            title: thread.title.clone(),
            body: thread.body.clone(),
            category: thread.category.clone().unwrap_or_else(|| "general".to_string()),
            created_at: timestamp(server.next_id),
            owner_id: owner.id,
            votes: VoterSet::default(),
            total_comments: 0,
        };
        server.details.insert(0, detail_of(&created));
        server.threads.insert(0, created.clone());
        Ok(created)
    }

    async fn create_comment(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        comment: &NewComment,
    ) -> RemoteResult<Comment> {
        self.record(format!("create_comment {thread_id}")).await;
        let mut server = self.server.lock().await;
        let owner = server.user_of(token)?;
        server.next_id += 1;

        let created = Comment {
            id: CommentId::new(format!("comment-{}", server.next_id)),
            content: comment.content.clone(),
            created_at: timestamp(server.next_id),
            owner,
            votes: VoterSet::default(),
        };
        let detail = server
            .details
            .iter_mut()
            .find(|d| &d.id == thread_id)
            .ok_or_else(|| status(404, "thread not found"))?;
        detail.comments.push(created.clone());
        if let Some(thread) = server.threads.iter_mut().find(|t| &t.id == thread_id) {
            thread.total_comments += 1;
        }
        Ok(created)
    }
}

#[async_trait]
impl VotingGateway for FakeForumApi {
    async fn vote_thread(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        intent: VoteIntent,
    ) -> RemoteResult<()> {
        self.vote(token, thread_id, None, intent).await
    }

    async fn vote_comment(
        &self,
        token: &AccessToken,
        thread_id: &ThreadId,
        comment_id: &CommentId,
        intent: VoteIntent,
    ) -> RemoteResult<()> {
        self.vote(token, thread_id, Some(comment_id), intent).await
    }
}

#[async_trait]
impl LeaderboardGateway for FakeForumApi {
    async fn list_leaderboards(&self) -> RemoteResult<Vec<LeaderboardEntry>> {
        self.record("list_leaderboards".to_string()).await;
        Ok(self.server.lock().await.leaderboards.clone())
    }
}

/// A client over `api` with an in-memory token store.
pub fn client(api: Arc<FakeForumApi>, options: VotingOptions) -> ForumClient {
    client_with_tokens(api, Arc::new(MemoryTokenStore::new()), options)
}

pub fn client_with_tokens(
    api: Arc<FakeForumApi>,
    tokens: Arc<MemoryTokenStore>,
    options: VotingOptions,
) -> ForumClient {
    ForumClient::new(Gateways::from_single(api), tokens, options)
}

// ── Builders ────────────────────────────────────────────────────────────────

pub fn token_for(user_id: &UserId) -> String {
    format!("token-{user_id}")
}

pub fn status(status: u16, message: &str) -> RemoteError {
    RemoteError::Status {
        status,
        message: message.to_string(),
    }
}

fn timestamp(offset: u32) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + i64::from(offset) * 60, 0).unwrap_or_default()
}

fn apply_intent(votes: &mut VoterSet, user: &UserId, intent: VoteIntent) {
    votes.remove_voter(user);
    match intent {
        VoteIntent::Up => votes.up_votes_by.push(user.clone()),
        VoteIntent::Down => votes.down_votes_by.push(user.clone()),
        VoteIntent::Neutral => {}
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.into(),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        avatar: None,
    }
}

pub fn thread(id: &str, category: &str) -> Thread {
    Thread {
        id: id.into(),
        title: format!("Thread {id}"),
        body: format!("Body of {id}"),
        category: category.to_string(),
        created_at: timestamp(0),
        owner_id: "owner".into(),
        votes: VoterSet::default(),
        total_comments: 0,
    }
}

pub fn voted(mut thread: Thread, up: &[&str], down: &[&str]) -> Thread {
    thread.votes = VoterSet::new(
        up.iter().map(|u| UserId::from(*u)).collect(),
        down.iter().map(|u| UserId::from(*u)).collect(),
    );
    thread
}

pub fn detail_of(thread: &Thread) -> ThreadDetail {
    ThreadDetail {
        id: thread.id.clone(),
        title: thread.title.clone(),
        body: thread.body.clone(),
        category: thread.category.clone(),
        created_at: thread.created_at,
        owner: User {
            email: String::new(),
            ..user(thread.owner_id.as_str())
        },
        votes: thread.votes.clone(),
        comments: Vec::new(),
    }
}

pub fn comment(id: &str, owner: &str) -> Comment {
    Comment {
        id: id.into(),
        content: format!("Comment {id}"),
        created_at: timestamp(1),
        owner: user(owner),
        votes: VoterSet::default(),
    }
}
