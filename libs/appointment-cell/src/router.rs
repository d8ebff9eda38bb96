// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/proximos", get(handlers::upcoming_appointments))
        .route("/historial", get(handlers::appointment_history))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancelar", patch(handlers::cancel_appointment))
        .route("/{appointment_id}/reprogramar", patch(handlers::reschedule_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
