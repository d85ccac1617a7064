//! # ForumClient
//!
//! The surface a front-end talks to: every service wired around one shared
//! store, with votes and creations made as the current session's user.

use std::sync::Arc;

use domains::{
    AuthGateway, Comment, CommentId, Credentials, LeaderboardEntry, LeaderboardGateway, NewComment,
    NewThread, Registration, Result, Session, Thread, ThreadDetail, ThreadGateway, ThreadId,
    TokenStore, User, VoteDirection, VoteTarget, VotingGateway,
};

use crate::auth::AuthService;
use crate::leaderboard::LeaderboardService;
use crate::state::VoteStatus;
use crate::store::ForumStore;
use crate::threads::ThreadService;
use crate::voting::{VoteOutcome, VotingOptions, VotingService};

/// One implementation per port, chosen by the composition root.
#[derive(Clone)]
pub struct Gateways {
    pub auth: Arc<dyn AuthGateway>,
    pub threads: Arc<dyn ThreadGateway>,
    pub voting: Arc<dyn VotingGateway>,
    pub leaderboard: Arc<dyn LeaderboardGateway>,
}

impl Gateways {
    /// Uses one value for every port, e.g. an HTTP client implementing all four.
    pub fn from_single<G>(gateway: Arc<G>) -> Self
    where
        G: AuthGateway + ThreadGateway + VotingGateway + LeaderboardGateway + 'static,
    {
        Self {
            auth: gateway.clone(),
            threads: gateway.clone(),
            voting: gateway.clone(),
            leaderboard: gateway,
        }
    }
}

pub struct ForumClient {
    store: ForumStore,
    auth: AuthService,
    threads: ThreadService,
    voting: VotingService,
    leaderboard: LeaderboardService,
}

impl ForumClient {
    pub fn new(gateways: Gateways, tokens: Arc<dyn TokenStore>, options: VotingOptions) -> Self {
        let store = ForumStore::new();
        Self {
            auth: AuthService::new(gateways.auth.clone(), tokens),
            threads: ThreadService::new(gateways.threads, gateways.auth, store.clone()),
            voting: VotingService::new(gateways.voting, store.clone(), options),
            leaderboard: LeaderboardService::new(gateways.leaderboard, store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &ForumStore {
        &self.store
    }

    // ── Session ─────────────────────────────────────────────────────────────

    pub async fn register(&self, registration: Registration) -> Result<User> {
        self.auth.register(registration).await
    }

    pub async fn login(&self, credentials: Credentials) -> Result<Session> {
        self.auth.login(credentials).await
    }

    pub async fn restore_session(&self) -> Result<Option<Session>> {
        self.auth.restore().await
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await
    }

    pub async fn session(&self) -> Option<Session> {
        self.auth.session().await
    }

    // ── Threads ─────────────────────────────────────────────────────────────

    pub async fn fetch_threads(&self) -> Result<Vec<Thread>> {
        self.threads.fetch_threads().await
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        self.threads.fetch_users().await
    }

    pub async fn open_thread(&self, id: &ThreadId) -> Result<ThreadDetail> {
        self.threads.fetch_thread_detail(id).await
    }

    pub async fn leave_thread(&self) {
        self.threads.leave_thread().await
    }

    pub async fn create_thread(&self, thread: NewThread) -> Result<Thread> {
        let session = self.auth.session().await;
        self.threads.create_thread(session.as_ref(), thread).await
    }

    pub async fn create_comment(
        &self,
        thread_id: &ThreadId,
        comment: NewComment,
    ) -> Result<Comment> {
        let session = self.auth.session().await;
        self.threads
            .create_comment(session.as_ref(), thread_id, comment)
            .await
    }

    pub async fn select_category(&self, category: Option<String>) {
        self.threads.select_category(category).await
    }

    pub async fn owner_of(&self, thread_id: &ThreadId) -> Option<User> {
        self.threads.owner_of(thread_id).await
    }

    // ── Votes ───────────────────────────────────────────────────────────────

    pub async fn vote_thread(
        &self,
        thread_id: &ThreadId,
        clicked: VoteDirection,
    ) -> Result<VoteOutcome> {
        let session = self.auth.session().await;
        self.voting
            .vote(session.as_ref(), VoteTarget::thread(thread_id.clone()), clicked)
            .await
    }

    pub async fn vote_comment(
        &self,
        thread_id: &ThreadId,
        comment_id: &CommentId,
        clicked: VoteDirection,
    ) -> Result<VoteOutcome> {
        let session = self.auth.session().await;
        let target = VoteTarget::comment(thread_id.clone(), comment_id.clone());
        self.voting.vote(session.as_ref(), target, clicked).await
    }

    // ── Leaderboard ─────────────────────────────────────────────────────────

    pub async fn fetch_leaderboards(&self) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboard.fetch_leaderboards().await
    }

    // ── Read side ───────────────────────────────────────────────────────────

    pub async fn threads(&self) -> Vec<Thread> {
        self.store.threads().await
    }

    pub async fn visible_threads(&self) -> Vec<Thread> {
        self.store.visible_threads().await
    }

    pub async fn categories(&self) -> Vec<String> {
        self.store.categories().await
    }

    pub async fn thread_detail(&self) -> Option<ThreadDetail> {
        self.store.thread_detail().await
    }

    pub async fn leaderboards(&self) -> Vec<LeaderboardEntry> {
        self.store.leaderboards().await
    }

    pub async fn vote_status(&self) -> VoteStatus {
        self.store.vote_status().await
    }

    pub async fn fetch_error(&self) -> Option<String> {
        self.store.fetch_error().await
    }
}
