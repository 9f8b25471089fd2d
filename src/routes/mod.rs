//! Router assembly.

mod common;
mod resource;

pub use common::common_routes;
pub use resource::{entity_routes, resource_routes};

use crate::state::AppState;
use crate::store::StoreFactory;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full application router: common routes plus every resource family, with request tracing and
/// a body size limit.
pub fn build_router<F: StoreFactory>(state: AppState<F>, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
}
