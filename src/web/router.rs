use axum::{middleware, routing::{get, post, put}, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use super::handlers::{
    count_requests, create_batch, create_notice, delete_notice, health, list_notices, stats, update_notice,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/notices", get(list_notices).post(create_notice))
        .route("/notices/batch", post(create_batch))
        .route("/notices/{id}", put(update_notice).patch(update_notice).delete(delete_notice))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
