// libs/document-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Routes nested under `/v1/turnos`: attach and list per appointment.
pub fn appointment_document_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/{appointment_id}/documentos", post(handlers::attach_document))
        .route("/{appointment_id}/documentos", get(handlers::appointment_documents))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

/// Routes nested under `/v1/documentos`: the caller's own listing and
/// statistics, plus download and delete by record id.
pub fn document_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/mis-documentos", get(handlers::my_documents))
        .route("/estadisticas", get(handlers::document_statistics))
        .route("/{document_id}/descargar", get(handlers::download_document))
        .route("/{document_id}", delete(handlers::delete_document))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
