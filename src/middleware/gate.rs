//! Session-gated access to the admin area.
//!
//! Every request outside the exclusion list is classified by path. Public and
//! login paths pass straight through; protected paths need the auth provider
//! to confirm a session within the configured timeout, or the request is
//! redirected to the login page. Any doubt about the session (error, timeout,
//! no session) ends in a redirect.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::auth::{ProviderError, Session, SessionClient, SessionProvider};
use crate::config::GateConfig;
use crate::cookies::{apply_set_cookies, CookieStore, SetCookie};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Login,
    Protected,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Session check timed out after {0:?}")]
    SessionCheckTimeout(Duration),

    #[error("Session check failed: {0}")]
    SessionCheckError(#[from] ProviderError),
}

/// Cookie mutations the gate made while verifying a protected request,
/// handed to the handler as a request extension. The gate still forwards them
/// itself; handlers read them to see the session as the gate left it.
#[derive(Debug, Clone, Default)]
pub struct VerifiedCookies(pub Vec<SetCookie>);

pub struct AccessGate {
    config: GateConfig,
    provider: Arc<dyn SessionProvider>,
}

impl AccessGate {
    pub fn new(config: GateConfig, provider: Arc<dyn SessionProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Static assets and framework paths never reach the gate
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.config.excluded_prefixes.iter().any(|prefix| is_under(path, prefix)) {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .config
                .excluded_extensions
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if is_under(path, &self.config.login_path) {
            RouteClass::Login
        } else if is_under(path, &self.config.protected_prefix) {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }

    /// Race the provider's session lookup against the configured timeout.
    /// The lookup future is dropped if the timer wins, cancelling its request.
    pub async fn verify(&self, client: &dyn SessionClient) -> Result<Option<Session>, GateError> {
        let limit = self.config.session_timeout();
        match tokio::time::timeout(limit, client.get_session()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GateError::SessionCheckTimeout(limit)),
        }
    }

    /// Absolute login URL on the request's own origin, or the configured one
    pub fn login_url(&self, uri: &Uri, headers: &HeaderMap) -> String {
        let origin = self
            .config
            .public_origin
            .clone()
            .or_else(|| request_origin(uri, headers, self.config.trust_forwarded_headers));

        origin
            .and_then(|origin| Url::parse(&origin).ok())
            .and_then(|base| base.join(&self.config.login_path).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| self.config.login_path.clone())
    }

    fn redirect_to_login(&self, uri: &Uri, headers: &HeaderMap) -> Response {
        // Fresh response: cookies captured from a failed check are never forwarded
        Redirect::temporary(&self.login_url(uri, headers)).into_response()
    }
}

/// Middleware entry point, installed with `axum::middleware::from_fn_with_state`
pub async fn access_gate(State(gate): State<Arc<AccessGate>>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if gate.is_excluded(&path) {
        return next.run(request).await;
    }

    let cookies = CookieStore::from_headers(request.headers());
    let client = gate.provider.bind(cookies.clone());

    match gate.classify(&path) {
        RouteClass::Public | RouteClass::Login => {
            let mutations = cookies.drain();
            let response = next.run(request).await;
            forward_cookies(response, &mutations)
        }
        RouteClass::Protected => match gate.verify(client.as_ref()).await {
            Ok(Some(session)) => {
                tracing::debug!("Session verified for {} on {}", session.principal(), path);
                let mutations = cookies.drain();
                request.extensions_mut().insert(session);
                request.extensions_mut().insert(VerifiedCookies(mutations.clone()));
                let response = next.run(request).await;
                forward_cookies(response, &mutations)
            }
            Ok(None) => {
                tracing::debug!("No session for {}; redirecting to login", path);
                gate.redirect_to_login(request.uri(), request.headers())
            }
            Err(e) => {
                tracing::warn!("Denying {}: {}", path, e);
                gate.redirect_to_login(request.uri(), request.headers())
            }
        },
    }
}

/// Attach provider cookie mutations to the downstream response. Cookies the
/// handler set itself take precedence over the gate's.
fn forward_cookies(mut response: Response, mutations: &[SetCookie]) -> Response {
    if mutations.is_empty() {
        return response;
    }

    let already_set: HashSet<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split_once('=').map(|(name, _)| name.trim().to_string()))
        .collect();

    let forwarded: Vec<SetCookie> = mutations
        .iter()
        .filter(|cookie| !already_set.contains(&cookie.name))
        .cloned()
        .collect();

    apply_set_cookies(response.headers_mut(), &forwarded);
    response
}

/// `path` equals `prefix` or lies beneath it on a segment boundary
fn is_under(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Origin the client addressed. `X-Forwarded-*` is client-controlled unless a
/// proxy rewrites it, so it is only read when `trust_forwarded` is set.
fn request_origin(uri: &Uri, headers: &HeaderMap, trust_forwarded: bool) -> Option<String> {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let forwarded = |name: &str| if trust_forwarded { header_str(name) } else { None };

    let host = forwarded("x-forwarded-host")
        .or_else(|| header_str(header::HOST.as_str()))
        .or_else(|| uri.authority().map(|a| a.to_string()))?;

    let scheme = forwarded("x-forwarded-proto")
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    Some(format!("{}://{}", scheme, host))
}
