use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub gate: GateConfig,
    pub auth: AuthProviderConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Path rules and timing for the admin access gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub protected_prefix: String,
    pub login_path: String,
    pub session_timeout_ms: u64,
    /// Path prefixes that bypass the gate entirely (framework assets, favicon)
    pub excluded_prefixes: Vec<String>,
    /// File extensions that bypass the gate entirely (images)
    pub excluded_extensions: Vec<String>,
    /// Fixed origin for login redirects; derived from the request when unset
    pub public_origin: Option<String>,
    /// Take the redirect origin from `X-Forwarded-Host`/`X-Forwarded-Proto`.
    /// Only safe behind a proxy that overwrites both headers.
    pub trust_forwarded_headers: bool,
}

/// Hosted auth provider settings. URL and anon key are required, but are only
/// validated when the provider client is first constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProviderConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub cookie_prefix: String,
    pub cookie_secure: bool,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub enable_request_logging: bool,
}

/// Errors raised when required configuration is absent or malformed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl GateConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefix: "/admin".to_string(),
            login_path: "/admin/login".to_string(),
            session_timeout_ms: 5000,
            excluded_prefixes: vec![
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/static".to_string(),
                "/favicon.ico".to_string(),
            ],
            excluded_extensions: ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            public_origin: None,
            trust_forwarded_headers: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Gate overrides
        if let Ok(v) = env::var("GATE_PROTECTED_PREFIX") {
            self.gate.protected_prefix = normalize_path(&v);
        }
        if let Ok(v) = env::var("GATE_LOGIN_PATH") {
            self.gate.login_path = normalize_path(&v);
        }
        if let Ok(v) = env::var("GATE_SESSION_TIMEOUT_MS") {
            self.gate.session_timeout_ms = v.parse().unwrap_or(self.gate.session_timeout_ms);
        }
        if let Ok(v) = env::var("GATE_EXCLUDED_PREFIXES") {
            self.gate.excluded_prefixes = split_list(&v);
        }
        if let Ok(v) = env::var("GATE_EXCLUDED_EXTENSIONS") {
            self.gate.excluded_extensions = split_list(&v)
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect();
        }
        if let Ok(v) = env::var("GATE_PUBLIC_ORIGIN") {
            self.gate.public_origin = Some(v.trim_end_matches('/').to_string()).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("GATE_TRUST_FORWARDED_HEADERS") {
            self.gate.trust_forwarded_headers = v.parse().unwrap_or(self.gate.trust_forwarded_headers);
        }

        // Auth provider overrides
        if let Ok(v) = env::var("AUTH_PROVIDER_URL") {
            self.auth.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("AUTH_PROVIDER_ANON_KEY") {
            self.auth.anon_key = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("AUTH_COOKIE_PREFIX") {
            self.auth.cookie_prefix = v;
        }
        if let Ok(v) = env::var("AUTH_COOKIE_SECURE") {
            self.auth.cookie_secure = v.parse().unwrap_or(self.auth.cookie_secure);
        }
        if let Ok(v) = env::var("AUTH_HTTP_TIMEOUT_SECS") {
            self.auth.http_timeout_secs = v.parse().unwrap_or(self.auth.http_timeout_secs);
        }

        // Server overrides
        if let Ok(v) = env::var("SERVER_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            gate: GateConfig::default(),
            auth: AuthProviderConfig {
                url: None,
                anon_key: None,
                cookie_prefix: "sb".to_string(),
                cookie_secure: false,
                http_timeout_secs: 10,
            },
            server: ServerConfig {
                enable_request_logging: true,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            gate: GateConfig::default(),
            auth: AuthProviderConfig {
                url: None,
                anon_key: None,
                cookie_prefix: "sb".to_string(),
                cookie_secure: true,
                http_timeout_secs: 10,
            },
            server: ServerConfig {
                enable_request_logging: true,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            gate: GateConfig::default(),
            auth: AuthProviderConfig {
                url: None,
                anon_key: None,
                cookie_prefix: "sb".to_string(),
                cookie_secure: true,
                http_timeout_secs: 5,
            },
            server: ServerConfig {
                enable_request_logging: false,
            },
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Leading slash, no trailing slash ("/" stays "/")
fn normalize_path(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
