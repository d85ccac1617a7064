//! # Auth Service
//!
//! Owns the current [`Session`] and keeps the persisted token in step with it.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use domains::{
    AccessToken, AppError, AuthGateway, Credentials, Registration, Result, Session, TokenStore,
    User,
};

pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    tokens: Arc<dyn TokenStore>,
    session: RwLock<Option<Session>>,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            gateway,
            tokens,
            session: RwLock::new(None),
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Creates an account. Does not log in.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        if registration.name.trim().is_empty() || registration.email.trim().is_empty() {
            return Err(AppError::ValidationError("name and email are required".to_string()));
        }
        let user = self.gateway.register(&registration).await?;
        info!(user = %user.id, "registered");
        Ok(user)
    }

    /// Exchanges credentials for a token, persists it and resolves the user.
    pub async fn login(&self, credentials: Credentials) -> Result<Session> {
        let token = self.gateway.login(&credentials).await?;
        self.tokens.save(&token).await?;
        let session = self.establish(token).await?;
        info!(user = %session.user.id, "logged in");
        Ok(session)
    }

    /// Resumes the session of a persisted token, if any.
    ///
    /// A token the server no longer accepts is discarded. Other failures
    /// keep it for the next attempt.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let Some(token) = self.tokens.load().await? else {
            return Ok(None);
        };

        match self.establish(token).await {
            Ok(session) => {
                info!(user = %session.user.id, "session restored");
                Ok(Some(session))
            }
            Err(AppError::Remote(error)) if error.is_unauthorized() => {
                warn!("persisted token rejected, discarding it");
                self.tokens.clear().await?;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    pub async fn logout(&self) -> Result<()> {
        *self.session.write().await = None;
        self.tokens.clear().await?;
        info!("logged out");
        Ok(())
    }

    async fn establish(&self, token: AccessToken) -> Result<Session> {
        let user = self.gateway.me(&token).await?;
        let session = Session { token, user };
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }
}
