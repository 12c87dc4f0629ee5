//! Minimal GoTrue-style auth server for tests.
//!
//! Access tokens: `valid-access` is accepted, `slow-access` is accepted after
//! ten seconds, `broken-access` yields a 500, anything else a 401.
//! Refresh token `refresh-1` rotates to `refresh-2`. The only account is
//! `owner@example.com` / `hunter2`.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub const OWNER_ID: &str = "7f0c7a52-3a5c-4d61-9b5e-2f1a9a6c1b11";
pub const OWNER_EMAIL: &str = "owner@example.com";

/// Serve the fake on an ephemeral port; returns its base URL
pub async fn start() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake auth server");
    let addr = listener.local_addr().expect("local addr");

    let app = Router::new()
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{}", addr)
}

fn user_json() -> Value {
    json!({ "id": OWNER_ID, "email": OWNER_EMAIL, "aud": "authenticated" })
}

fn tokens(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh,
        "user": user_json(),
    })
}

fn api_key_ok(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(super::ANON_KEY)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response()
}

async fn user(headers: HeaderMap) -> Response {
    if !api_key_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid API key" }))).into_response();
    }

    match bearer(&headers).as_deref() {
        Some("valid-access") => Json(user_json()).into_response(),
        Some("slow-access") => {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(user_json()).into_response()
        }
        Some("broken-access") => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "msg": "database unavailable" }))).into_response()
        }
        _ => unauthorized(),
    }
}

async fn token(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api_key_ok(&headers) {
        return unauthorized();
    }

    let invalid_grant = || {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
        )
            .into_response()
    };

    match params.get("grant_type").map(String::as_str) {
        Some("password") => {
            if body["email"] == OWNER_EMAIL && body["password"] == "hunter2" {
                Json(tokens("valid-access", "refresh-1")).into_response()
            } else {
                invalid_grant()
            }
        }
        Some("refresh_token") => {
            if body["refresh_token"] == "refresh-1" {
                Json(tokens("valid-access", "refresh-2")).into_response()
            } else {
                invalid_grant()
            }
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "unsupported_grant_type" }))).into_response(),
    }
}

async fn logout(headers: HeaderMap) -> Response {
    match bearer(&headers).as_deref() {
        Some("valid-access") => StatusCode::NO_CONTENT.into_response(),
        _ => unauthorized(),
    }
}
