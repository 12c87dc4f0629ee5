use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use super::{ProviderError, Session, SessionClient, SessionProvider};
use crate::config::{AuthProviderConfig, ConfigError};
use crate::cookies::{CookieStore, SetCookie};

/// Refresh tokens outlive access tokens; the provider revokes them server-side
const REFRESH_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: ProviderUser,
}

#[derive(Debug)]
struct ProviderSettings {
    base_url: Url,
    anon_key: String,
    access_cookie: String,
    refresh_cookie: String,
    cookie_secure: bool,
}

/// Client for a GoTrue-compatible hosted auth REST API
#[derive(Debug, Clone)]
pub struct HostedAuthProvider {
    http: Client,
    settings: Arc<ProviderSettings>,
}

impl HostedAuthProvider {
    /// Validate the provider configuration and build the HTTP client
    pub fn from_config(config: &AuthProviderConfig) -> Result<Self, ConfigError> {
        let raw_url = config.url.as_deref().ok_or(ConfigError::Missing("AUTH_PROVIDER_URL"))?;
        let anon_key = config
            .anon_key
            .clone()
            .ok_or(ConfigError::Missing("AUTH_PROVIDER_ANON_KEY"))?;

        let mut base_url = Url::parse(raw_url).map_err(|e| ConfigError::Invalid {
            name: "AUTH_PROVIDER_URL",
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "AUTH_PROVIDER_URL",
                reason: format!("unsupported scheme '{}'", base_url.scheme()),
            });
        }
        // Endpoints are joined relative to the base, which must end in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        if config.cookie_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "AUTH_COOKIE_PREFIX",
                reason: "must not be empty".to_string(),
            });
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            settings: Arc::new(ProviderSettings {
                base_url,
                anon_key,
                access_cookie: format!("{}-access-token", config.cookie_prefix),
                refresh_cookie: format!("{}-refresh-token", config.cookie_prefix),
                cookie_secure: config.cookie_secure,
            }),
        })
    }

    pub fn access_cookie_name(&self) -> &str {
        &self.settings.access_cookie
    }

    pub fn refresh_cookie_name(&self) -> &str {
        &self.settings.refresh_cookie
    }
}

impl SessionProvider for HostedAuthProvider {
    fn bind(&self, cookies: CookieStore) -> Box<dyn SessionClient> {
        // Empty token cookies are leftovers from a broken write; drop them
        let stale: Vec<SetCookie> = [&self.settings.access_cookie, &self.settings.refresh_cookie]
            .into_iter()
            .filter(|name| cookies.get(name).is_some_and(|v| v.trim().is_empty()))
            .map(|name| SetCookie::removal(name.as_str()).secure(self.settings.cookie_secure))
            .collect();
        if !stale.is_empty() {
            cookies.set_all(stale);
        }

        Box::new(HostedSessionClient {
            http: self.http.clone(),
            settings: self.settings.clone(),
            cookies,
        })
    }
}

struct HostedSessionClient {
    http: Client,
    settings: Arc<ProviderSettings>,
    cookies: CookieStore,
}

impl HostedSessionClient {
    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.settings
            .base_url
            .join(path)
            .map_err(|e| ProviderError::Malformed(format!("bad endpoint '{}': {}", path, e)))
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Option<ProviderUser>, ProviderError> {
        let response = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(decode(response).await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(unexpected(response).await),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<Session>, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/token?grant_type=refresh_token")?)
            .header("apikey", &self.settings.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let tokens: TokenResponse = decode(response).await?;
                tracing::debug!("Refreshed session for user {}", tokens.user.id);
                Ok(Some(self.store_tokens(tokens)))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::debug!("Refresh token rejected; clearing session cookies");
                self.clear_cookies();
                Ok(None)
            }
            _ => Err(unexpected(response).await),
        }
    }

    fn store_tokens(&self, tokens: TokenResponse) -> Session {
        let secure = self.settings.cookie_secure;
        self.cookies.set_all(vec![
            SetCookie::new(self.settings.access_cookie.as_str(), tokens.access_token)
                .max_age(tokens.expires_in)
                .secure(secure),
            SetCookie::new(self.settings.refresh_cookie.as_str(), tokens.refresh_token)
                .max_age(REFRESH_COOKIE_MAX_AGE_SECS)
                .secure(secure),
        ]);

        Session {
            user_id: tokens.user.id,
            email: tokens.user.email,
            expires_at: Some(Utc::now() + ChronoDuration::seconds(tokens.expires_in)),
        }
    }

    fn clear_cookies(&self) {
        let secure = self.settings.cookie_secure;
        self.cookies.set_all(vec![
            SetCookie::removal(self.settings.access_cookie.as_str()).secure(secure),
            SetCookie::removal(self.settings.refresh_cookie.as_str()).secure(secure),
        ]);
    }
}

#[async_trait]
impl SessionClient for HostedSessionClient {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        let access = self.cookies.get(&self.settings.access_cookie);
        let refresh = self.cookies.get(&self.settings.refresh_cookie);

        if let Some(token) = access.as_deref() {
            if let Some(user) = self.fetch_user(token).await? {
                return Ok(Some(Session {
                    user_id: user.id,
                    email: user.email,
                    expires_at: None,
                }));
            }
        }

        match refresh.as_deref() {
            Some(token) => self.refresh(token).await,
            None => {
                if access.is_some() {
                    self.clear_cookies();
                }
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/token?grant_type=password")?)
            .header("apikey", &self.settings.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let tokens: TokenResponse = decode(response).await?;
                Ok(self.store_tokens(tokens))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ProviderError::InvalidCredentials)
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let access = self.cookies.get(&self.settings.access_cookie);
        self.clear_cookies();

        let Some(token) = access else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Token already expired or revoked
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

async fn unexpected(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = match response.json::<Value>().await {
        Ok(body) => ["error_description", "msg", "message", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.to_string()),
        Err(_) => "no response body".to_string(),
    };
    ProviderError::UnexpectedStatus { status, message }
}
