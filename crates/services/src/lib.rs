//! rusty-forum/crates/services/src/lib.rs
//!
//! Client-side forum logic: optimistic voting, the thread/category
//! aggregate and session handling, all driven through the ports in `domains`.

pub mod auth;
pub mod client;
pub mod leaderboard;
mod ledger;
pub mod state;
pub mod store;
pub mod threads;
pub mod voting;

#[cfg(test)]
mod fixtures;

pub use auth::AuthService;
pub use client::{ForumClient, Gateways};
pub use leaderboard::LeaderboardService;
pub use state::{ForumState, VoteStatus};
pub use store::ForumStore;
pub use threads::ThreadService;
pub use voting::{VoteOutcome, VotingOptions, VotingService};
