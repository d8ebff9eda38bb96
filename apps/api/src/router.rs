use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use appointment_cell::router::appointment_routes;
use document_cell::router::{appointment_document_routes, document_routes};
use nutritionist_cell::router::nutritionist_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;
use shared_utils::envelope::error_path_middleware;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Nutrito API is running!" }))
        .nest(
            "/v1/turnos",
            appointment_routes(state.clone()).merge(appointment_document_routes(state.clone())),
        )
        .nest("/v1/nutricionistas", nutritionist_routes(state.clone()))
        .nest("/v1/pacientes", patient_routes(state.clone()))
        .nest("/v1/documentos", document_routes(state))
        .layer(middleware::from_fn(error_path_middleware))
}
