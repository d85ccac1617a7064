//! # Vote State Calculator
//!
//! Pure computation of a target's next voter sets after a vote click.
//! Callers are responsible for authentication; nothing here can fail.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{CommentId, ThreadId, UserId};

/// The up/down voter IDs attached to a thread or comment.
///
/// A user ID is never present in both sequences, and never twice in one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterSet {
    #[serde(default)]
    pub up_votes_by: Vec<UserId>,
    #[serde(default)]
    pub down_votes_by: Vec<UserId>,
}

/// The control the user clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    Up,
    Down,
}

/// Where a user's vote on a target ends up. Also the `{intent}-vote` path
/// segment of the remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteIntent {
    Up,
    Down,
    Neutral,
}

/// Result of [`compute_next_vote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextVote {
    pub votes: VoterSet,
    pub intent: VoteIntent,
}

/// What a vote applies to. Comments are addressed through their thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Thread {
        thread_id: ThreadId,
    },
    Comment {
        thread_id: ThreadId,
        comment_id: CommentId,
    },
}

impl VoterSet {
    pub fn new(up_votes_by: Vec<UserId>, down_votes_by: Vec<UserId>) -> Self {
        Self {
            up_votes_by,
            down_votes_by,
        }
    }

    /// The user's current standing on this target.
    pub fn intent_of(&self, user: &UserId) -> VoteIntent {
        if self.up_votes_by.contains(user) {
            VoteIntent::Up
        } else if self.down_votes_by.contains(user) {
            VoteIntent::Down
        } else {
            VoteIntent::Neutral
        }
    }

    /// Removes the user from both sequences. Safe to call when absent.
    pub fn remove_voter(&mut self, user: &UserId) {
        self.up_votes_by.retain(|id| id != user);
        self.down_votes_by.retain(|id| id != user);
    }

    pub fn score(&self) -> i64 {
        self.up_votes_by.len() as i64 - self.down_votes_by.len() as i64
    }

    /// True when no user appears twice or on both sides.
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.up_votes_by
            .iter()
            .chain(self.down_votes_by.iter())
            .all(|id| seen.insert(id))
    }
}

impl From<VoteDirection> for VoteIntent {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => VoteIntent::Up,
            VoteDirection::Down => VoteIntent::Down,
        }
    }
}

impl VoteIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteIntent::Up => "up",
            VoteIntent::Down => "down",
            VoteIntent::Neutral => "neutral",
        }
    }
}

impl fmt::Display for VoteIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NextVote {
    pub fn score(&self) -> i64 {
        self.votes.score()
    }
}

impl VoteTarget {
    pub fn thread(thread_id: impl Into<ThreadId>) -> Self {
        VoteTarget::Thread {
            thread_id: thread_id.into(),
        }
    }

    pub fn comment(thread_id: impl Into<ThreadId>, comment_id: impl Into<CommentId>) -> Self {
        VoteTarget::Comment {
            thread_id: thread_id.into(),
            comment_id: comment_id.into(),
        }
    }

    pub fn thread_id(&self) -> &ThreadId {
        match self {
            VoteTarget::Thread { thread_id } | VoteTarget::Comment { thread_id, .. } => thread_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VoteTarget::Thread { .. } => "thread",
            VoteTarget::Comment { .. } => "comment",
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteTarget::Thread { thread_id } => write!(f, "thread {thread_id}"),
            VoteTarget::Comment {
                thread_id,
                comment_id,
            } => write!(f, "comment {comment_id} on thread {thread_id}"),
        }
    }
}

/// Computes the voter sets after `acting_user` clicks `clicked`.
///
/// Clicking the direction the user already holds clears their vote;
/// any other click moves them to the clicked side.
pub fn compute_next_vote(
    current: &VoterSet,
    acting_user: &UserId,
    clicked: VoteDirection,
) -> NextVote {
    let clicked = VoteIntent::from(clicked);
    let intent = if current.intent_of(acting_user) == clicked {
        VoteIntent::Neutral
    } else {
        clicked
    };

    let mut votes = current.clone();
    votes.remove_voter(acting_user);
    match intent {
        VoteIntent::Up => votes.up_votes_by.push(acting_user.clone()),
        VoteIntent::Down => votes.down_votes_by.push(acting_user.clone()),
        VoteIntent::Neutral => {}
    }

    NextVote { votes, intent }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<UserId> {
        raw.iter().map(|id| UserId::from(*id)).collect()
    }

    #[test]
    fn test_upvote_from_neutral() {
        let next = compute_next_vote(&VoterSet::default(), &"u1".into(), VoteDirection::Up);
        assert_eq!(next.intent, VoteIntent::Up);
        assert_eq!(next.votes.up_votes_by, ids(&["u1"]));
        assert_eq!(next.score(), 1);
    }

    #[test]
    fn test_switch_up_to_down() {
        let current = VoterSet::new(ids(&["u1", "u2"]), vec![]);
        let next = compute_next_vote(&current, &"u1".into(), VoteDirection::Down);

        assert_eq!(next.intent, VoteIntent::Down);
        assert_eq!(next.votes.up_votes_by, ids(&["u2"]));
        assert_eq!(next.votes.down_votes_by, ids(&["u1"]));
        assert_eq!(next.score(), 0);
    }

    #[test]
    fn test_vote_then_unvote_restores_original() {
        let original = VoterSet::new(ids(&["a"]), ids(&["b"]));
        let twice = |user: &str, direction| {
            let user = UserId::from(user);
            let once = compute_next_vote(&original, &user, direction);
            compute_next_vote(&once.votes, &user, direction).votes
        };

        // Starting neutral.
        assert_eq!(twice("c", VoteDirection::Up), original);
        assert_eq!(twice("c", VoteDirection::Down), original);
        // Starting on the clicked side.
        assert_eq!(twice("a", VoteDirection::Up), original);
        assert_eq!(twice("b", VoteDirection::Down), original);
    }

    #[test]
    fn test_opposite_holder_clicking_twice_ends_neutral() {
        let original = VoterSet::new(ids(&["a"]), ids(&["b"]));
        let b = UserId::from("b");

        let once = compute_next_vote(&original, &b, VoteDirection::Up);
        assert_eq!(once.intent, VoteIntent::Up);
        let twice = compute_next_vote(&once.votes, &b, VoteDirection::Up);

        assert_eq!(twice.intent, VoteIntent::Neutral);
        assert_eq!(twice.votes, VoterSet::new(ids(&["a"]), vec![]));
    }

    #[test]
    fn test_clicking_held_vote_clears_it() {
        let current = VoterSet::new(vec![], ids(&["u1"]));
        let next = compute_next_vote(&current, &"u1".into(), VoteDirection::Down);
        assert_eq!(next.intent, VoteIntent::Neutral);
        assert_eq!(next.votes, VoterSet::default());
    }

    #[test]
    fn test_remove_voter_is_idempotent() {
        let mut once = VoterSet::new(ids(&["a", "b"]), ids(&["c"]));
        once.remove_voter(&"a".into());
        let mut twice = once.clone();
        twice.remove_voter(&"a".into());
        assert_eq!(once, twice);

        let mut absent = VoterSet::new(ids(&["a"]), vec![]);
        absent.remove_voter(&"zz".into());
        assert_eq!(absent.up_votes_by, ids(&["a"]));
    }

    #[test]
    fn test_no_user_on_both_sides_after_any_click_sequence() {
        let users = ids(&["a", "b", "c"]);
        let clicks = [VoteDirection::Up, VoteDirection::Down];
        let mut votes = VoterSet::default();

        // Walk a deterministic pseudo-random click sequence.
        let mut seed: u32 = 7;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let user = &users[(seed >> 8) as usize % users.len()];
            let click = clicks[(seed >> 16) as usize % clicks.len()];
            votes = compute_next_vote(&votes, user, click).votes;
            assert!(votes.is_consistent(), "inconsistent after {user} {click:?}: {votes:?}");
        }
    }

    #[test]
    fn test_intent_path_segment() {
        assert_eq!(VoteIntent::Up.to_string(), "up");
        assert_eq!(VoteIntent::Neutral.as_str(), "neutral");
        assert_eq!(serde_json::to_string(&VoteIntent::Down).unwrap(), "\"down\"");
    }
}
