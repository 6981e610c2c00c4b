//! HTTP routing
//!
//! Every registered event hook path is served by its own
//! [`verification::EndpointHandler`]. A path that ends in `/` also covers
//! everything below it, so the default `/` answers on any path.

pub mod verification;

use crate::state::VerifierState;
use axum::http::StatusCode;
use axum::routing::any;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the router with one verification route per registered path
pub fn build_router(state: &VerifierState) -> Router {
    let mut router = Router::new();

    for endpoint in &state.endpoints {
        for pattern in route_patterns(endpoint.path()) {
            tracing::debug!(path = %endpoint.path(), %pattern, "adding route");
            router = router.route(
                &pattern,
                any(verification::verify).with_state(Arc::clone(endpoint)),
            );
        }
    }

    router.fallback(not_found).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                state.config.request_timeout(),
            )),
    )
}

/// Router patterns serving `path`. Subtree paths get a trailing wildcard.
fn route_patterns(path: &str) -> Vec<String> {
    let mut patterns = vec![path.to_string()];
    if path.ends_with('/') {
        patterns.push(format!("{path}{{*rest}}"));
    }
    patterns
}

/// 404 Not Found handler
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
