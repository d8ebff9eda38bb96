// libs/patient-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/{patient_id}", get(handlers::get_patient_profile))
        .route("/{patient_id}", patch(handlers::update_patient_profile))
        .route("/{patient_id}/turnos", get(handlers::patient_appointments))
        .route("/{patient_id}/nutricionistas", get(handlers::linked_nutritionists))
        .route("/{patient_id}/resumen", get(handlers::activity_summary))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
