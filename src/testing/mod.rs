//! In-process session provider for router and middleware tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::auth::{ProviderError, Session, SessionClient, SessionProvider};
use crate::cookies::{CookieStore, SetCookie};

/// How [`FakeProvider`] answers a session lookup
#[derive(Debug, Clone)]
pub enum Behavior {
    NoSession,
    /// Session found; also writes a refreshed `sb-access-token`
    Valid,
    Fails,
    /// Session found after the delay; writes `sb-access-token=late`
    Slow(Duration),
}

pub struct FakeProvider {
    behavior: Behavior,
    bind_cookie: Option<SetCookie>,
    checks: Arc<AtomicUsize>,
    last_store: Arc<Mutex<Option<CookieStore>>>,
    revoked: Arc<Mutex<Option<String>>>,
}

impl FakeProvider {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            bind_cookie: None,
            checks: Arc::new(AtomicUsize::new(0)),
            last_store: Arc::new(Mutex::new(None)),
            revoked: Arc::new(Mutex::new(None)),
        }
    }

    /// Cookie written while binding, before any session lookup
    pub fn with_bind_cookie(mut self, cookie: SetCookie) -> Self {
        self.bind_cookie = Some(cookie);
        self
    }

    /// Counter of `get_session` calls across all bound clients
    pub fn checks(&self) -> Arc<AtomicUsize> {
        self.checks.clone()
    }

    /// The cookie store handed to the most recent `bind`
    pub fn last_store(&self) -> Arc<Mutex<Option<CookieStore>>> {
        self.last_store.clone()
    }

    /// Access token seen by the most recent `sign_out`
    pub fn revoked(&self) -> Arc<Mutex<Option<String>>> {
        self.revoked.clone()
    }
}

pub fn owner_session() -> Session {
    Session {
        user_id: Uuid::nil(),
        email: Some("owner@example.com".to_string()),
        expires_at: None,
    }
}

struct FakeClient {
    behavior: Behavior,
    cookies: CookieStore,
    checks: Arc<AtomicUsize>,
    revoked: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl SessionClient for FakeClient {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::NoSession => Ok(None),
            Behavior::Valid => {
                self.cookies.set_all(vec![SetCookie::new("sb-access-token", "refreshed")]);
                Ok(Some(owner_session()))
            }
            Behavior::Fails => Err(ProviderError::UnexpectedStatus {
                status: 500,
                message: "provider down".to_string(),
            }),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                self.cookies.set_all(vec![SetCookie::new("sb-access-token", "late")]);
                Ok(Some(owner_session()))
            }
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        if email != "owner@example.com" || password != "hunter2" {
            return Err(ProviderError::InvalidCredentials);
        }
        self.cookies.set_all(vec![SetCookie::new("sb-access-token", "signed-in")]);
        Ok(owner_session())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Ok(mut revoked) = self.revoked.lock() {
            *revoked = self.cookies.get("sb-access-token");
        }
        self.cookies.set_all(vec![
            SetCookie::removal("sb-access-token"),
            SetCookie::removal("sb-refresh-token"),
        ]);
        Ok(())
    }
}

impl SessionProvider for FakeProvider {
    fn bind(&self, cookies: CookieStore) -> Box<dyn SessionClient> {
        if let Some(cookie) = &self.bind_cookie {
            cookies.set_all(vec![cookie.clone()]);
        }
        if let Ok(mut last) = self.last_store.lock() {
            *last = Some(cookies.clone());
        }
        Box::new(FakeClient {
            behavior: self.behavior.clone(),
            cookies,
            checks: self.checks.clone(),
            revoked: self.revoked.clone(),
        })
    }
}
