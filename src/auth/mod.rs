//! Session provider interface.
//!
//! The service never validates credentials itself. A [`SessionProvider`]
//! binds a [`SessionClient`] to one request's cookies, and the client asks the
//! hosted auth provider whether those cookies carry a valid session.

pub mod hosted;
pub mod shared;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cookies::CookieStore;

pub use hosted::HostedAuthProvider;
pub use shared::SharedProvider;

/// A session recognised by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Only known when the provider has just issued the tokens
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Principal identifier shown to the user: email when known, else the user id
    pub fn principal(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.user_id.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Auth provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth provider returned {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Malformed auth provider response: {0}")]
    Malformed(String),
}

/// A client bound to a single request's cookie jar
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Current session for the bound cookies, refreshing tokens if the provider allows
    async fn get_session(&self) -> Result<Option<Session>, ProviderError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    /// Clears the session cookies even when revocation at the provider fails
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

pub trait SessionProvider: Send + Sync + 'static {
    /// Build a session-aware client over `cookies`. Binding may already record
    /// cookie mutations in the store.
    fn bind(&self, cookies: CookieStore) -> Box<dyn SessionClient>;
}
