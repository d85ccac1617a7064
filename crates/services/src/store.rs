//! Shared handle to [`ForumState`].
//!
//! All services of one client hold clones of the same store. Mutations take
//! the write lock for their whole duration and never await while holding it,
//! so a reader sees either none or all of a dual-write.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use domains::{LeaderboardEntry, Thread, ThreadDetail, ThreadId, VoteTarget, VoterSet};

use crate::state::{ForumState, VoteStatus};

#[derive(Debug, Clone, Default)]
pub struct ForumStore {
    inner: Arc<RwLock<ForumState>>,
}

impl ForumStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ForumState> {
        self.inner.read().await
    }

    /// Mutations go through the services only.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, ForumState> {
        self.inner.write().await
    }

    pub(crate) fn try_write(&self) -> Result<RwLockWriteGuard<'_, ForumState>, TryLockError> {
        self.inner.try_write()
    }

    pub async fn threads(&self) -> Vec<Thread> {
        self.read().await.threads().to_vec()
    }

    pub async fn thread(&self, id: &ThreadId) -> Option<Thread> {
        self.read().await.thread(id).cloned()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.read().await.categories().to_vec()
    }

    pub async fn thread_detail(&self) -> Option<ThreadDetail> {
        self.read().await.thread_detail().cloned()
    }

    pub async fn select_by_category(&self, category: Option<&str>) -> Vec<Thread> {
        self.read()
            .await
            .select_by_category(category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn visible_threads(&self) -> Vec<Thread> {
        self.read().await.visible_threads().into_iter().cloned().collect()
    }

    pub async fn set_selected_category(&self, category: Option<String>) {
        self.write().await.set_selected_category(category);
    }

    pub async fn leaderboards(&self) -> Vec<LeaderboardEntry> {
        self.read().await.leaderboards().to_vec()
    }

    pub async fn voter_set(&self, target: &VoteTarget) -> Option<VoterSet> {
        self.read().await.voter_set(target)
    }

    pub async fn vote_status(&self) -> VoteStatus {
        self.read().await.vote_status().clone()
    }

    pub async fn fetch_error(&self) -> Option<String> {
        self.read().await.fetch_error().map(str::to_string)
    }
}
