//! Authenticated session types.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::models::User;

/// Bearer credential issued by `POST /login`. Redacted in `Debug`.
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl Clone for AccessToken {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

/// The logged-in user together with the credential used for their calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: AccessToken,
    pub user: User,
}
