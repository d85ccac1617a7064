//! # Thread Service
//!
//! Remote-backed half of the thread/category aggregator: fetches and
//! creations go through the [`ThreadGateway`], results land in the store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use domains::{
    AppError, AuthGateway, Comment, NewComment, NewThread, RemoteError, Result, Session, Thread,
    ThreadDetail, ThreadGateway, ThreadId, User,
};

use crate::store::ForumStore;

pub struct ThreadService {
    gateway: Arc<dyn ThreadGateway>,
    users: Arc<dyn AuthGateway>,
    store: ForumStore,
}

impl ThreadService {
    pub fn new(
        gateway: Arc<dyn ThreadGateway>,
        users: Arc<dyn AuthGateway>,
        store: ForumStore,
    ) -> Self {
        Self { gateway, users, store }
    }

    /// Replaces the thread list with the server's. On failure the cached
    /// list stays as it was.
    pub async fn fetch_threads(&self) -> Result<Vec<Thread>> {
        let threads = self.fetched("threads", self.gateway.list_threads().await).await?;
        debug!(count = threads.len(), "fetched threads");

        let mut state = self.store.write().await;
        state.apply_fetched_threads(threads.clone());
        state.set_fetch_error(None);
        Ok(threads)
    }

    pub async fn fetch_thread_detail(&self, id: &ThreadId) -> Result<ThreadDetail> {
        let resource = format!("thread {id}");
        let detail = self.fetched(&resource, self.gateway.get_thread(id).await).await?;
        debug!(thread = %id, comments = detail.comments.len(), "fetched thread detail");

        let mut state = self.store.write().await;
        state.apply_thread_detail(detail.clone());
        state.set_fetch_error(None);
        Ok(detail)
    }

    /// Fetches all users so list threads can show their owner.
    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        let users = self.fetched("users", self.users.list_users().await).await?;

        let mut state = self.store.write().await;
        state.apply_users(users.clone());
        state.set_fetch_error(None);
        Ok(users)
    }

    /// Owner of a list thread, resolved from the fetched users.
    pub async fn owner_of(&self, thread_id: &ThreadId) -> Option<User> {
        let state = self.store.read().await;
        let thread = state.thread(thread_id)?;
        state.user(&thread.owner_id).cloned()
    }

    pub async fn create_thread(
        &self,
        session: Option<&Session>,
        thread: NewThread,
    ) -> Result<Thread> {
        let session = session.ok_or(AppError::Unauthenticated)?;
        validate_present("title", &thread.title)?;
        validate_present("body", &thread.body)?;

        let created = self.gateway.create_thread(&session.token, &thread).await?;
        info!(thread = %created.id, category = %created.category, "created thread");

        self.store.write().await.apply_created_thread(created.clone());
        Ok(created)
    }

    pub async fn create_comment(
        &self,
        session: Option<&Session>,
        thread_id: &ThreadId,
        comment: NewComment,
    ) -> Result<Comment> {
        let session = session.ok_or(AppError::Unauthenticated)?;
        validate_present("content", &comment.content)?;

        let created = self
            .gateway
            .create_comment(&session.token, thread_id, &comment)
            .await?;
        info!(thread = %thread_id, comment = %created.id, "created comment");

        self.store
            .write()
            .await
            .apply_created_comment(thread_id, created.clone());
        Ok(created)
    }

    /// Drops the open thread detail.
    pub async fn leave_thread(&self) {
        self.store.write().await.clear_thread_detail();
    }

    pub async fn select_category(&self, category: Option<String>) {
        self.store.set_selected_category(category).await;
    }

    async fn fetched<T>(
        &self,
        resource: &str,
        result: std::result::Result<T, RemoteError>,
    ) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(source) => {
                warn!(resource, error = %source, "fetch failed");
                let error = AppError::fetch(resource)(source);
                self.store.write().await.set_fetch_error(Some(error.to_string()));
                Err(error)
            }
        }
    }
}

fn validate_present(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{field} must not be empty")));
    }
    Ok(())
}
