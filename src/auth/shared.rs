use once_cell::sync::OnceCell;

use super::{HostedAuthProvider, SessionClient, SessionProvider};
use crate::config::{AuthProviderConfig, ConfigError};
use crate::cookies::CookieStore;

static PROVIDER: OnceCell<HostedAuthProvider> = OnceCell::new();

/// Get the process-wide provider, constructing it from `config` on first use.
/// Later calls return the same instance and ignore `config`.
pub fn init(config: &AuthProviderConfig) -> Result<&'static HostedAuthProvider, ConfigError> {
    PROVIDER.get_or_try_init(|| {
        let provider = HostedAuthProvider::from_config(config)?;
        tracing::info!("Auth provider client initialized");
        Ok(provider)
    })
}

/// Forwards every call to the shared [`HostedAuthProvider`].
///
/// Construction forces the singleton into existence, so holding a
/// `SharedProvider` means the configuration has already been validated.
#[derive(Debug, Clone, Copy)]
pub struct SharedProvider {
    inner: &'static HostedAuthProvider,
}

impl SharedProvider {
    pub fn new(config: &AuthProviderConfig) -> Result<Self, ConfigError> {
        Ok(Self { inner: init(config)? })
    }

    pub fn get(&self) -> &'static HostedAuthProvider {
        self.inner
    }
}

impl SessionProvider for SharedProvider {
    fn bind(&self, cookies: CookieStore) -> Box<dyn SessionClient> {
        self.inner.bind(cookies)
    }
}
