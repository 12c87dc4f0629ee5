use axum::Extension;
use serde_json::{json, Value};

use crate::auth::Session;
use crate::middleware::ApiResponse;

/// GET /admin - Dashboard landing data for the signed-in owner
pub async fn dashboard(Extension(session): Extension<Session>) -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "principal": session.principal(),
        "user_id": session.user_id,
        "email": session.email,
        "expires_at": session.expires_at,
    }))
}
