use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::cookies::CookieStore;
use crate::error::ApiError;
use crate::handlers::with_cookies;
use crate::middleware::ApiResponse;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// GET /admin/login - Describe the login form
///
/// Reports whether the request already carries a valid session so a client can
/// skip straight to the dashboard. Any failure of that lookup reads as "no".
pub async fn login_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookies = CookieStore::from_headers(&headers);
    let client = state.provider.bind(cookies.clone());

    let session = match state.gate.verify(client.as_ref()).await {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!("Login page session lookup failed: {}", e);
            None
        }
    };

    let gate = state.gate.config();
    let body = ApiResponse::success(json!({
        "authenticated": session.is_some(),
        "principal": session.as_ref().map(|s| s.principal()),
        "fields": ["email", "password"],
        "submit": gate.login_path,
        "redirect_to": gate.protected_prefix,
    }));

    with_cookies(body, &cookies)
}

/// POST /admin/login - Sign in with email and password
///
/// Expected Input:
/// ```json
/// { "email": "owner@example.com", "password": "..." }
/// ```
///
/// On success the provider's token cookies are set on the response. A body
/// that is not this shape is a 400 like any other bad input.
pub async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Rejected login body: {}", rejection.body_text());
        ApiError::bad_request("Expected JSON body with email and password")
    })?;

    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let cookies = CookieStore::from_headers(&headers);
    let client = state.provider.bind(cookies.clone());

    let session = client.sign_in_with_password(email, &payload.password).await.map_err(|e| {
        tracing::warn!("Sign-in failed for {}: {}", email, e);
        ApiError::from(e)
    })?;

    tracing::info!("Signed in {}", session.principal());

    let body = ApiResponse::success(json!({
        "user": {
            "id": session.user_id,
            "email": session.email,
        },
        "expires_at": session.expires_at,
        "redirect_to": state.gate.config().protected_prefix,
    }));

    Ok(with_cookies(body, &cookies))
}
