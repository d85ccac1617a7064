//! JSON shapes of the forum API that never leave this crate.

use serde::Deserialize;

use domains::{Comment, LeaderboardEntry, Thread, ThreadDetail, User};

/// Every successful response: `{ "status": "success", "message": "...", "data": { ... } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Error responses: `{ "status": "fail", "message": "..." }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Failure {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserData {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersData {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenData {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThreadsData {
    pub threads: Vec<Thread>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThreadData {
    pub thread: Thread,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetailData {
    pub detail_thread: ThreadDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentData {
    pub comment: Comment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardsData {
    pub leaderboards: Vec<LeaderboardEntry>,
}

/// Message of an error body, or the raw body when it is not JSON.
pub(crate) fn failure_message(body: &str) -> String {
    match serde_json::from_str::<Failure>(body) {
        Ok(failure) if !failure.message.is_empty() => failure.message,
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_prefers_json_message() {
        assert_eq!(
            failure_message(r#"{"status":"fail","message":"thread tidak ditemukan"}"#),
            "thread tidak ditemukan"
        );
        assert_eq!(failure_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_detail_envelope_key() {
        let body = serde_json::json!({
            "status": "success",
            "message": "ok",
            "data": { "detailThread": {
                "id": "thread-1",
                "title": "T",
                "body": "B",
                "category": "General",
                "createdAt": "2021-06-21T07:00:00.000Z",
                "owner": { "id": "users-1", "name": "John", "avatar": "a.jpg" },
                "upVotesBy": [],
                "downVotesBy": [],
                "comments": []
            }}
        });

        let envelope: Envelope<DetailData> = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.data.detail_thread.id.as_str(), "thread-1");
    }
}
