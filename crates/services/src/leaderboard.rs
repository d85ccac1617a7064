use std::sync::Arc;

use tracing::{debug, warn};

use domains::{AppError, LeaderboardEntry, LeaderboardGateway, Result};

use crate::store::ForumStore;

pub struct LeaderboardService {
    gateway: Arc<dyn LeaderboardGateway>,
    store: ForumStore,
}

impl LeaderboardService {
    pub fn new(gateway: Arc<dyn LeaderboardGateway>, store: ForumStore) -> Self {
        Self { gateway, store }
    }

    /// Replaces the cached leaderboard, keeping the server's order.
    pub async fn fetch_leaderboards(&self) -> Result<Vec<LeaderboardEntry>> {
        match self.gateway.list_leaderboards().await {
            Ok(entries) => {
                debug!(count = entries.len(), "fetched leaderboards");
                let mut state = self.store.write().await;
                state.apply_leaderboards(entries.clone());
                state.set_fetch_error(None);
                Ok(entries)
            }
            Err(source) => {
                warn!(error = %source, "leaderboard fetch failed");
                let error = AppError::fetch("leaderboards")(source);
                self.store.write().await.set_fetch_error(Some(error.to_string()));
                Err(error)
            }
        }
    }
}
