//! Builders shared by the unit tests of this crate.

use chrono::{TimeZone, Utc};
use domains::{AccessToken, Comment, Session, Thread, ThreadDetail, User, UserId, VoterSet};

use crate::store::ForumStore;

pub(crate) fn user(id: &str) -> User {
    User {
        id: id.into(),
        name: format!("name of {id}"),
        email: format!("{id}@example.com"),
        avatar: None,
    }
}

pub(crate) fn session(user_id: &str) -> Session {
    Session {
        token: AccessToken::new(format!("token-{user_id}")),
        user: user(user_id),
    }
}

pub(crate) fn thread(id: &str, category: &str) -> Thread {
    Thread {
        id: id.into(),
        title: format!("title of {id}"),
        body: format!("body of {id}"),
        category: category.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        owner_id: "owner".into(),
        votes: VoterSet::default(),
        total_comments: 0,
    }
}

pub(crate) fn thread_with_votes(id: &str, up: &[&str], down: &[&str]) -> Thread {
    let ids = |raw: &[&str]| -> Vec<UserId> { raw.iter().map(|u| UserId::from(*u)).collect() };
    Thread {
        votes: VoterSet::new(ids(up), ids(down)),
        ..thread(id, "general")
    }
}

pub(crate) fn detail_of(thread: &Thread) -> ThreadDetail {
    ThreadDetail {
        id: thread.id.clone(),
        title: thread.title.clone(),
        body: thread.body.clone(),
        category: thread.category.clone(),
        created_at: thread.created_at,
        owner: user(thread.owner_id.as_str()),
        votes: thread.votes.clone(),
        comments: Vec::new(),
    }
}

pub(crate) fn comment(id: &str) -> Comment {
    Comment {
        id: id.into(),
        content: format!("content of {id}"),
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        owner: user("commenter"),
        votes: VoterSet::default(),
    }
}

/// A store holding `threads` and, optionally, an open detail.
pub(crate) async fn store_with(threads: Vec<Thread>, detail: Option<ThreadDetail>) -> ForumStore {
    let store = ForumStore::new();
    {
        let mut state = store.write().await;
        state.apply_fetched_threads(threads);
        if let Some(detail) = detail {
            state.apply_thread_detail(detail);
        }
    }
    store
}
