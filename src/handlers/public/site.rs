use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::ApiResponse;
use crate::server::AppState;

/// GET / - Service description
pub async fn root(State(state): State<AppState>) -> ApiResponse<Value> {
    let gate = state.gate.config();

    ApiResponse::success(json!({
        "name": "Admin Gate",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Personal site with a session-gated admin area",
        "production": crate::is_production!(),
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "login": format!("{} (public - GET form, POST credentials)", gate.login_path),
            "admin": format!("{}/* (session required)", gate.protected_prefix),
        }
    }))
}

/// GET /health - Liveness check; does not contact the auth provider
pub async fn health() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
