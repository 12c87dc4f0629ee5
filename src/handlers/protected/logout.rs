use axum::{
    extract::State,
    http::HeaderMap,
    response::{Redirect, Response},
    Extension,
};

use crate::cookies::CookieStore;
use crate::handlers::with_cookies;
use crate::middleware::VerifiedCookies;
use crate::server::AppState;

/// POST /admin/logout - End the session and return to the login page
///
/// Revokes the tokens as the gate left them: if the gate just refreshed an
/// expired access token, the new one is revoked, not the stale one the browser
/// sent. Session cookies are cleared even if revocation fails.
pub async fn logout(
    State(state): State<AppState>,
    verified: Option<Extension<VerifiedCookies>>,
    headers: HeaderMap,
) -> Response {
    let cookies = CookieStore::from_headers(&headers);
    if let Some(Extension(VerifiedCookies(refreshed))) = verified {
        cookies.absorb(&refreshed);
    }
    let client = state.provider.bind(cookies.clone());

    if let Err(e) = client.sign_out().await {
        tracing::warn!("Token revocation failed during logout: {}", e);
    }

    with_cookies(Redirect::to(&state.gate.config().login_path), &cookies)
}
