//! Pending-vote ledger.
//!
//! Tracks, per target, the votes whose remote call has not resolved yet,
//! oldest first, each with the voter sets it replaced. Vote intents are
//! absolute, so a newer vote supersedes every older one on the same target.

use std::collections::HashMap;

use domains::{VoteTarget, VoterSet};

/// Identifies one dispatched vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Ticket(u64);

#[derive(Debug)]
struct PendingVote {
    ticket: Ticket,
    snapshot: VoterSet,
}

#[derive(Debug, Default)]
pub(crate) struct PendingVotes {
    next: u64,
    by_target: HashMap<VoteTarget, Vec<PendingVote>>,
}

impl PendingVotes {
    /// Records a vote about to be dispatched, with the sets it overwrote.
    pub(crate) fn begin(&mut self, target: &VoteTarget, snapshot: VoterSet) -> Ticket {
        self.next += 1;
        let ticket = Ticket(self.next);
        self.by_target
            .entry(target.clone())
            .or_default()
            .push(PendingVote { ticket, snapshot });
        ticket
    }

    /// The vote was accepted: it and everything older is settled.
    pub(crate) fn settle(&mut self, target: &VoteTarget, ticket: Ticket) {
        if let Some(pending) = self.by_target.get_mut(target) {
            pending.retain(|vote| vote.ticket > ticket);
        }
        self.prune(target);
    }

    /// The vote was rejected. Returns the sets to restore, if any.
    ///
    /// Only the newest pending vote restores. An older one hands its
    /// snapshot to the next newer vote, whose optimistic state was built on
    /// top of the failed one. A vote already superseded restores nothing.
    pub(crate) fn fail(&mut self, target: &VoteTarget, ticket: Ticket) -> Option<VoterSet> {
        let pending = self.by_target.get_mut(target)?;
        let index = pending.iter().position(|vote| vote.ticket == ticket)?;
        let failed = pending.remove(index);

        let restore = match pending.get_mut(index) {
            Some(newer) => {
                newer.snapshot = failed.snapshot;
                None
            }
            None => Some(failed.snapshot),
        };
        self.prune(target);
        restore
    }

    /// The vote's outcome will never be known. Its optimistic state stays,
    /// so newer votes keep their own snapshots.
    pub(crate) fn abandon(&mut self, target: &VoteTarget, ticket: Ticket) {
        if let Some(pending) = self.by_target.get_mut(target) {
            pending.retain(|vote| vote.ticket != ticket);
        }
        self.prune(target);
    }

    pub(crate) fn in_flight(&self, target: &VoteTarget) -> usize {
        self.by_target.get(target).map_or(0, Vec::len)
    }

    fn prune(&mut self, target: &VoteTarget) {
        if self.by_target.get(target).is_some_and(Vec::is_empty) {
            self.by_target.remove(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(up: &[&str]) -> VoterSet {
        VoterSet::new(up.iter().map(|id| (*id).into()).collect(), vec![])
    }

    #[test]
    fn test_single_failure_restores_snapshot() {
        let target = VoteTarget::thread("t1");
        let mut ledger = PendingVotes::default();

        let ticket = ledger.begin(&target, set(&["a"]));

        assert_eq!(ledger.fail(&target, ticket), Some(set(&["a"])));
        assert_eq!(ledger.in_flight(&target), 0);
    }

    #[test]
    fn test_older_failure_hands_snapshot_to_newer() {
        let target = VoteTarget::thread("t1");
        let mut ledger = PendingVotes::default();

        let first = ledger.begin(&target, set(&[]));
        let second = ledger.begin(&target, set(&["u1"]));

        assert_eq!(ledger.fail(&target, first), None);
        assert_eq!(ledger.fail(&target, second), Some(set(&[])));
    }

    #[test]
    fn test_abandoned_vote_leaves_newer_snapshot() {
        let target = VoteTarget::thread("t1");
        let mut ledger = PendingVotes::default();

        let first = ledger.begin(&target, set(&[]));
        let second = ledger.begin(&target, set(&["u1"]));
        ledger.abandon(&target, first);

        assert_eq!(ledger.in_flight(&target), 1);
        assert_eq!(ledger.fail(&target, second), Some(set(&["u1"])));
        assert_eq!(ledger.in_flight(&target), 0);
    }

    #[test]
    fn test_success_supersedes_older_votes() {
        let target = VoteTarget::thread("t1");
        let mut ledger = PendingVotes::default();

        let first = ledger.begin(&target, set(&[]));
        let second = ledger.begin(&target, set(&["u1"]));
        ledger.settle(&target, second);

        assert_eq!(ledger.fail(&target, first), None);
        assert_eq!(ledger.in_flight(&target), 0);
    }

    #[test]
    fn test_targets_are_independent() {
        let t1 = VoteTarget::thread("t1");
        let c1 = VoteTarget::comment("t1", "c1");
        let mut ledger = PendingVotes::default();

        let on_thread = ledger.begin(&t1, set(&["x"]));
        let on_comment = ledger.begin(&c1, set(&["y"]));

        assert_eq!(ledger.fail(&c1, on_comment), Some(set(&["y"])));
        assert_eq!(ledger.in_flight(&t1), 1);
        assert_eq!(ledger.fail(&t1, on_thread), Some(set(&["x"])));
    }
}
