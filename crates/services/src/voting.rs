//! # Optimistic Mutation Coordinator
//!
//! Applies a vote to local state before the remote call, then keeps or
//! reverts it depending on the outcome.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use domains::{
    compute_next_vote, AccessToken, AppError, RemoteError, Result, Session, VoteDirection,
    VoteIntent, VoteTarget, VoterSet, VotingGateway,
};

use crate::ledger::Ticket;
use crate::state::ForumState;
use crate::store::ForumStore;

#[derive(Debug, Clone, Default)]
pub struct VotingOptions {
    /// Deadline for the remote vote call. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// What the local state shows after a vote was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub votes: VoterSet,
    pub intent: VoteIntent,
    pub score: i64,
}

pub struct VotingService {
    gateway: Arc<dyn VotingGateway>,
    store: ForumStore,
    options: VotingOptions,
}

impl VotingService {
    pub fn new(gateway: Arc<dyn VotingGateway>, store: ForumStore, options: VotingOptions) -> Self {
        Self {
            gateway,
            store,
            options,
        }
    }

    /// Votes on `target` as the session's user.
    ///
    /// Local state is updated before the remote call. If the call fails the
    /// change is reverted before the error is returned. Dropping the future
    /// before the call resolves keeps the optimistic state.
    pub async fn vote(
        &self,
        session: Option<&Session>,
        target: VoteTarget,
        clicked: VoteDirection,
    ) -> Result<VoteOutcome> {
        let session = session.ok_or(AppError::Unauthenticated)?;

        // 1. Optimistic write into every local copy, under one lock.
        let (ticket, outcome) = {
            let mut state = self.store.write().await;
            let current = state
                .voter_set(&target)
                .ok_or_else(|| not_found(&target))?;

            let next = compute_next_vote(&current, &session.user.id, clicked);
            let copies = state.write_voter_set(&target, &next.votes);
            let ticket = state.pending.begin(&target, current);
            state.vote_status_mut().in_flight += 1;

            debug!(%target, intent = %next.intent, copies, "applied optimistic vote");
            let outcome = VoteOutcome {
                score: next.score(),
                intent: next.intent,
                votes: next.votes,
            };
            (ticket, outcome)
        };
        let mut in_flight = InFlightVote {
            store: self.store.clone(),
            target: target.clone(),
            ticket,
            resolved: false,
        };

        // 2. The only suspension point.
        let result = self.dispatch(&session.token, &target, outcome.intent).await;

        // 3. Settle or roll back.
        let mut state = self.store.write().await;
        in_flight.resolved = true;
        let status = state.vote_status_mut();
        status.in_flight = status.in_flight.saturating_sub(1);

        match result {
            Ok(()) => {
                state.pending.settle(&target, ticket);
                state.vote_status_mut().last_error = None;
                info!(%target, intent = %outcome.intent, "vote accepted");
                Ok(outcome)
            }
            Err(source) => {
                if let Some(snapshot) = state.pending.fail(&target, ticket) {
                    state.write_voter_set(&target, &snapshot);
                    warn!(%target, error = %source, "vote rejected, rolled back");
                } else {
                    warn!(%target, error = %source, "vote rejected, superseded by a newer vote");
                }
                let error = AppError::RemoteVoteFailed { target, source };
                state.vote_status_mut().last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    async fn dispatch(
        &self,
        token: &AccessToken,
        target: &VoteTarget,
        intent: VoteIntent,
    ) -> std::result::Result<(), RemoteError> {
        let call = async {
            match target {
                VoteTarget::Thread { thread_id } => {
                    self.gateway.vote_thread(token, thread_id, intent).await
                }
                VoteTarget::Comment {
                    thread_id,
                    comment_id,
                } => {
                    self.gateway
                        .vote_comment(token, thread_id, comment_id, intent)
                        .await
                }
            }
        };

        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(RemoteError::Timeout)),
            None => call.await,
        }
    }
}

/// Ledger entry and in-flight count of one dispatched vote, released on
/// drop unless the vote was settled or rolled back.
struct InFlightVote {
    store: ForumStore,
    target: VoteTarget,
    ticket: Ticket,
    resolved: bool,
}

impl Drop for InFlightVote {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        let target = &self.target;
        warn!(%target, "vote dropped before the server answered");

        if let Ok(mut state) = self.store.try_write() {
            release(&mut state, target, self.ticket);
            return;
        }
        // Lock is busy; finish on the runtime.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let store = self.store.clone();
            let target = self.target.clone();
            let ticket = self.ticket;
            handle.spawn(async move {
                release(&mut *store.write().await, &target, ticket);
            });
        }
    }
}

fn release(state: &mut ForumState, target: &VoteTarget, ticket: Ticket) {
    state.pending.abandon(target, ticket);
    let status = state.vote_status_mut();
    status.in_flight = status.in_flight.saturating_sub(1);
}

fn not_found(target: &VoteTarget) -> AppError {
    let id = match target {
        VoteTarget::Thread { thread_id } => thread_id.to_string(),
        VoteTarget::Comment { comment_id, .. } => comment_id.to_string(),
    };
    AppError::NotFound(target.kind().to_string(), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{comment, detail_of, session, store_with, thread, thread_with_votes};
    use domains::{CommentId, MockVotingGateway, RemoteResult, ThreadId, UserId};
    use tokio_test::{assert_err, assert_ok};

    /// Never answers.
    struct Hanging;

    #[async_trait::async_trait]
    impl VotingGateway for Hanging {
        async fn vote_thread(
            &self,
            _: &AccessToken,
            _: &ThreadId,
            _: VoteIntent,
        ) -> RemoteResult<()> {
            std::future::pending().await
        }

        async fn vote_comment(
            &self,
            _: &AccessToken,
            _: &ThreadId,
            _: &CommentId,
            _: VoteIntent,
        ) -> RemoteResult<()> {
            std::future::pending().await
        }
    }

    fn service(gateway: MockVotingGateway, store: &ForumStore) -> VotingService {
        VotingService::new(Arc::new(gateway), store.clone(), VotingOptions::default())
    }

    fn rejected() -> RemoteError {
        RemoteError::Status {
            status: 500,
            message: "internal".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_vote_touches_nothing() {
        let store = ForumStore::new();
        store.write().await.apply_fetched_threads(vec![thread("t1", "general")]);

        let mut gateway = MockVotingGateway::new();
        gateway.expect_vote_thread().times(0);
        gateway.expect_vote_comment().times(0);

        let result = service(gateway, &store)
            .vote(None, VoteTarget::thread("t1"), VoteDirection::Up)
            .await;

        assert!(matches!(result, Err(AppError::Unauthenticated)));
        assert_eq!(store.thread(&"t1".into()).await.unwrap().votes, VoterSet::default());
        assert_eq!(store.vote_status().await.in_flight, 0);
    }

    #[tokio::test]
    async fn test_upvote_success_keeps_optimistic_state() {
        let store = ForumStore::new();
        store.write().await.apply_fetched_threads(vec![thread("t1", "general")]);

        let mut gateway = MockVotingGateway::new();
        gateway
            .expect_vote_thread()
            .withf(|_, id, intent| id.as_str() == "t1" && *intent == VoteIntent::Up)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = assert_ok!(
            service(gateway, &store)
                .vote(Some(&session("u1")), VoteTarget::thread("t1"), VoteDirection::Up)
                .await
        );

        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.intent, VoteIntent::Up);
        let t1 = store.thread(&"t1".into()).await.unwrap();
        assert_eq!(t1.votes.up_votes_by, vec![UserId::from("u1")]);
        assert_eq!(store.vote_status().await.last_error, None);
    }

    #[tokio::test]
    async fn test_failed_upvote_rolls_back_to_empty() {
        let store = ForumStore::new();
        store.write().await.apply_fetched_threads(vec![thread("t1", "general")]);

        let mut gateway = MockVotingGateway::new();
        gateway
            .expect_vote_thread()
            .times(1)
            .returning(|_, _, _| Err(rejected()));

        let result = service(gateway, &store)
            .vote(Some(&session("u1")), VoteTarget::thread("t1"), VoteDirection::Up)
            .await;

        assert!(matches!(result, Err(AppError::RemoteVoteFailed { .. })));
        let t1 = store.thread(&"t1".into()).await.unwrap();
        assert_eq!(t1.votes, VoterSet::default());
        assert_eq!(t1.score(), 0);
        assert!(store.vote_status().await.last_error.is_some());
    }

    #[tokio::test]
    async fn test_rollback_restores_exact_snapshot() {
        let store = ForumStore::new();
        store
            .write()
            .await
            .apply_fetched_threads(vec![thread_with_votes("t1", &["a"], &[])]);

        let mut gateway = MockVotingGateway::new();
        gateway
            .expect_vote_thread()
            .withf(|_, id, intent| id.as_str() == "t1" && *intent == VoteIntent::Down)
            .returning(|_, _, _| Err(rejected()));

        assert_err!(
            service(gateway, &store)
                .vote(Some(&session("b")), VoteTarget::thread("t1"), VoteDirection::Down)
                .await
        );

        let t1 = store.thread(&"t1".into()).await.unwrap();
        assert_eq!(t1.votes, VoterSet::new(vec!["a".into()], vec![]));
    }

    #[tokio::test]
    async fn test_dual_write_on_success_and_rollback() {
        let store = ForumStore::new();
        let t1 = thread("t1", "general");
        {
            let mut state = store.write().await;
            state.apply_fetched_threads(vec![t1.clone()]);
            state.apply_thread_detail(detail_of(&t1));
        }

        let mut gateway = MockVotingGateway::new();
        let mut calls = 0;
        gateway.expect_vote_thread().times(2).returning(move |_, _, _| {
            calls += 1;
            if calls == 1 {
                Ok(())
            } else {
                Err(rejected())
            }
        });
        let voting = service(gateway, &store);

        let target = VoteTarget::thread("t1");
        assert_ok!(voting.vote(Some(&session("u1")), target.clone(), VoteDirection::Up).await);
        let listed = store.thread(&"t1".into()).await.unwrap().votes;
        assert_eq!(listed, store.thread_detail().await.unwrap().votes);
        assert_eq!(listed.up_votes_by, vec![UserId::from("u1")]);

        assert_err!(voting.vote(Some(&session("u2")), target, VoteDirection::Down).await);
        let listed = store.thread(&"t1".into()).await.unwrap().votes;
        assert_eq!(listed, store.thread_detail().await.unwrap().votes);
        assert_eq!(listed, VoterSet::new(vec!["u1".into()], vec![]));
    }

    #[tokio::test]
    async fn test_comment_vote_sends_neutral_when_toggling_off() {
        let store = ForumStore::new();
        let mut detail = detail_of(&thread("t1", "general"));
        let mut c1 = comment("c1");
        c1.votes = VoterSet::new(vec!["u1".into()], vec![]);
        detail.comments.push(c1);
        store.write().await.apply_thread_detail(detail);

        let mut gateway = MockVotingGateway::new();
        gateway
            .expect_vote_comment()
            .withf(|_, t, c, intent| {
                t.as_str() == "t1" && c.as_str() == "c1" && *intent == VoteIntent::Neutral
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let outcome = assert_ok!(
            service(gateway, &store)
                .vote(Some(&session("u1")), VoteTarget::comment("t1", "c1"), VoteDirection::Up)
                .await
        );

        assert_eq!(outcome.intent, VoteIntent::Neutral);
        let detail = store.thread_detail().await.unwrap();
        assert_eq!(detail.comments[0].votes, VoterSet::default());
    }

    #[tokio::test]
    async fn test_vote_on_unknown_target_makes_no_call() {
        let store = ForumStore::new();
        let mut gateway = MockVotingGateway::new();
        gateway.expect_vote_comment().times(0);

        let result = service(gateway, &store)
            .vote(Some(&session("u1")), VoteTarget::comment("t1", "c1"), VoteDirection::Down)
            .await;

        assert!(matches!(
            result,
            Err(AppError::NotFound(kind, id)) if kind == "comment" && id == "c1"
        ));
    }

    #[tokio::test]
    async fn test_timeout_rolls_back() {
        let store = ForumStore::new();
        store.write().await.apply_fetched_threads(vec![thread("t1", "general")]);

        let voting = VotingService::new(
            Arc::new(Hanging),
            store.clone(),
            VotingOptions {
                timeout: Some(Duration::from_millis(50)),
            },
        );

        let result = voting
            .vote(Some(&session("u1")), VoteTarget::thread("t1"), VoteDirection::Up)
            .await;

        assert!(matches!(
            result,
            Err(AppError::RemoteVoteFailed {
                source: RemoteError::Timeout,
                ..
            })
        ));
        assert_eq!(store.thread(&"t1".into()).await.unwrap().votes, VoterSet::default());
    }

    #[tokio::test]
    async fn test_thread_vote_builds_on_open_detail() {
        let listed = thread("t1", "general");
        let mut detail = detail_of(&listed);
        detail.votes = VoterSet::new(vec!["x".into()], vec![]);
        let store = store_with(vec![listed], Some(detail)).await;

        let mut gateway = MockVotingGateway::new();
        gateway.expect_vote_thread().times(1).returning(|_, _, _| Ok(()));

        let outcome = assert_ok!(
            service(gateway, &store)
                .vote(Some(&session("a")), VoteTarget::thread("t1"), VoteDirection::Up)
                .await
        );

        let expected = VoterSet::new(vec!["x".into(), "a".into()], vec![]);
        assert_eq!(outcome.votes, expected);
        assert_eq!(store.thread_detail().await.unwrap().votes, expected);
        assert_eq!(store.thread(&"t1".into()).await.unwrap().votes, expected);
    }

    #[tokio::test]
    async fn test_dropped_vote_releases_in_flight_and_keeps_state() {
        let store = store_with(vec![thread("t1", "general")], None).await;
        let voting = VotingService::new(Arc::new(Hanging), store.clone(), VotingOptions::default());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            voting.vote(Some(&session("u1")), VoteTarget::thread("t1"), VoteDirection::Up),
        )
        .await;
        assert!(abandoned.is_err());

        assert_eq!(store.vote_status().await.in_flight, 0);
        assert_eq!(store.read().await.pending_votes(&VoteTarget::thread("t1")), 0);
        let t1 = store.thread(&"t1".into()).await.unwrap();
        assert_eq!(t1.votes.up_votes_by, vec![UserId::from("u1")]);
    }
}
