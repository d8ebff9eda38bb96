// libs/nutritionist-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn nutritionist_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::search_nutritionists))
        .route("/{nutritionist_id}", get(handlers::get_nutritionist_profile))
        .route("/{nutritionist_id}/disponibilidad", get(handlers::check_availability))
        .route("/{nutritionist_id}/horarios", get(handlers::attention_hours))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
