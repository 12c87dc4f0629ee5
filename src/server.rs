use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::SessionProvider;
use crate::config::GateConfig;
use crate::handlers::{self, protected, public};
use crate::middleware::{access_gate, AccessGate};

/// Shared handler state: the session provider and the gate built over it
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn SessionProvider>,
    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(config: GateConfig, provider: Arc<dyn SessionProvider>) -> Self {
        let gate = Arc::new(AccessGate::new(config, provider.clone()));
        Self { provider, gate }
    }
}

pub fn app(state: AppState, enable_request_logging: bool) -> Router {
    let gate = state.gate.clone();
    let config = gate.config().clone();

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route(
            &config.login_path,
            get(public::login_form).post(public::login_submit),
        )
        // Protected admin area
        .route(&config.protected_prefix, get(protected::dashboard))
        .route(&format!("{}/logout", config.protected_prefix), post(protected::logout))
        .fallback(handlers::not_found)
        .with_state(state)
        // Every route, including the fallback, passes through the gate
        .layer(from_fn_with_state(gate, access_gate));

    if enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
