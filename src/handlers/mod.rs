// handlers/mod.rs - Two-tier handler layout
//
// Public (no session required) → Protected (session verified by the access gate)
pub mod public;
pub mod protected;

use axum::{
    http::Uri,
    response::{IntoResponse, Response},
};

use crate::cookies::{apply_set_cookies, CookieStore};
use crate::error::ApiError;

/// Attach the cookie mutations a handler's session client recorded
pub(crate) fn with_cookies(response: impl IntoResponse, cookies: &CookieStore) -> Response {
    let mut response = response.into_response();
    apply_set_cookies(response.headers_mut(), &cookies.drain());
    response
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
