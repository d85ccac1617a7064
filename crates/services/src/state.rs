//! # Forum State
//!
//! The client-side working set: thread list, derived categories, the open
//! thread detail, leaderboard and the status fields a UI renders from.
//! Every method here is synchronous; [`crate::store::ForumStore`] decides
//! when a write lock is held around them.

use domains::{
    Comment, LeaderboardEntry, Thread, ThreadDetail, ThreadId, User, UserId, VoteTarget, VoterSet,
};

use crate::ledger::PendingVotes;

/// In-flight count and last failure of vote calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteStatus {
    pub in_flight: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct ForumState {
    threads: Vec<Thread>,
    categories: Vec<String>,
    selected_category: Option<String>,
    detail: Option<ThreadDetail>,
    users: Vec<User>,
    leaderboards: Vec<LeaderboardEntry>,
    fetch_error: Option<String>,
    vote_status: VoteStatus,
    pub(crate) pending: PendingVotes,
}

impl ForumState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn thread_detail(&self) -> Option<&ThreadDetail> {
        self.detail.as_ref()
    }

    pub fn thread(&self, id: &ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| &t.id == id)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn leaderboards(&self) -> &[LeaderboardEntry] {
        &self.leaderboards
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    pub fn vote_status(&self) -> &VoteStatus {
        &self.vote_status
    }

    /// Votes on `target` whose remote call has not resolved yet.
    pub fn pending_votes(&self, target: &VoteTarget) -> usize {
        self.pending.in_flight(target)
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    // ── Thread list & categories ────────────────────────────────────────────

    /// Replaces the thread list and rebuilds the category set in
    /// first-seen order.
    pub fn apply_fetched_threads(&mut self, threads: Vec<Thread>) {
        let mut categories: Vec<String> = Vec::new();
        for thread in &threads {
            if !thread.category.is_empty() && !categories.contains(&thread.category) {
                categories.push(thread.category.clone());
            }
        }
        self.threads = threads;
        self.categories = categories;
    }

    /// Prepends a freshly created thread. A new category goes to the end of
    /// the set; existing entries keep their order.
    pub fn apply_created_thread(&mut self, thread: Thread) {
        if !thread.category.is_empty() && !self.categories.contains(&thread.category) {
            self.categories.push(thread.category.clone());
        }
        self.threads.insert(0, thread);
    }

    /// Threads whose category equals `category`, or all of them for `None`.
    pub fn select_by_category(&self, category: Option<&str>) -> Vec<&Thread> {
        match category {
            Some(category) => self.threads.iter().filter(|t| t.category == category).collect(),
            None => self.threads.iter().collect(),
        }
    }

    pub fn set_selected_category(&mut self, category: Option<String>) {
        self.selected_category = category;
    }

    /// The list filtered by the selected category.
    pub fn visible_threads(&self) -> Vec<&Thread> {
        self.select_by_category(self.selected_category.as_deref())
    }

    // ── Detail & comments ───────────────────────────────────────────────────

    pub fn apply_thread_detail(&mut self, detail: ThreadDetail) {
        self.detail = Some(detail);
    }

    pub fn clear_thread_detail(&mut self) {
        self.detail = None;
    }

    /// Appends `comment` to the open detail when it shows `thread_id`, and
    /// counts it on the list entry either way.
    pub fn apply_created_comment(&mut self, thread_id: &ThreadId, comment: Comment) {
        if let Some(thread) = self.threads.iter_mut().find(|t| &t.id == thread_id) {
            thread.total_comments += 1;
        }
        if let Some(detail) = self.detail.as_mut().filter(|d| &d.id == thread_id) {
            detail.comments.push(comment);
        }
    }

    // ── Users, leaderboard, status ──────────────────────────────────────────

    pub fn apply_users(&mut self, users: Vec<User>) {
        self.users = users;
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn apply_leaderboards(&mut self, leaderboards: Vec<LeaderboardEntry>) {
        self.leaderboards = leaderboards;
    }

    pub fn set_fetch_error(&mut self, error: Option<String>) {
        self.fetch_error = error;
    }

    pub(crate) fn vote_status_mut(&mut self) -> &mut VoteStatus {
        &mut self.vote_status
    }

    // ── Vote targets ────────────────────────────────────────────────────────

    /// Current voter sets of `target`. Threads read the open detail first,
    /// as it was fetched after the list, and fall back to the list entry;
    /// comments live only in the detail.
    pub fn voter_set(&self, target: &VoteTarget) -> Option<VoterSet> {
        match target {
            VoteTarget::Thread { thread_id } => self
                .open_detail(thread_id)
                .map(|d| d.votes.clone())
                .or_else(|| self.thread(thread_id).map(|t| t.votes.clone())),
            VoteTarget::Comment {
                thread_id,
                comment_id,
            } => self
                .open_detail(thread_id)
                .and_then(|d| d.comment(comment_id))
                .map(|c| c.votes.clone()),
        }
    }

    /// Writes `votes` into every local copy of `target` and returns how many
    /// copies were touched.
    pub(crate) fn write_voter_set(&mut self, target: &VoteTarget, votes: &VoterSet) -> usize {
        let mut touched = 0;
        match target {
            VoteTarget::Thread { thread_id } => {
                if let Some(thread) = self.threads.iter_mut().find(|t| &t.id == thread_id) {
                    thread.votes = votes.clone();
                    touched += 1;
                }
                if let Some(detail) = self.detail.as_mut().filter(|d| &d.id == thread_id) {
                    detail.votes = votes.clone();
                    touched += 1;
                }
            }
            VoteTarget::Comment {
                thread_id,
                comment_id,
            } => {
                if let Some(comment) = self
                    .detail
                    .as_mut()
                    .filter(|d| &d.id == thread_id)
                    .and_then(|d| d.comment_mut(comment_id))
                {
                    comment.votes = votes.clone();
                    touched += 1;
                }
            }
        }
        touched
    }

    fn open_detail(&self, thread_id: &ThreadId) -> Option<&ThreadDetail> {
        self.detail.as_ref().filter(|d| &d.id == thread_id)
    }
}
