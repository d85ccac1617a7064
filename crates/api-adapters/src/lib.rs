//! # api-adapters
//!
//! Implementations of the `domains` gateway ports against the forum REST API.

#[cfg(feature = "http-reqwest")]
pub mod http;
#[cfg(feature = "http-reqwest")]
mod wire;

#[cfg(feature = "http-reqwest")]
pub use http::{HttpForumApi, HttpOptions};

/// Public instance of the forum API.
pub const DEFAULT_BASE_URL: &str = "https://forum-api.dicoding.dev/v1";
