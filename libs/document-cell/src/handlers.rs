// libs/document-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::require_patient;

use crate::models::{AttachDocumentRequest, DocumentFilter, DocumentType};
use crate::services::document::DocumentService;

#[derive(Debug, Deserialize)]
pub struct MyDocumentsQueryParams {
    pub tipo: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MyDocumentsQueryParams {
    pub fn into_filter(self) -> Result<DocumentFilter, AppError> {
        let document_type = match &self.tipo {
            Some(raw) => Some(raw.parse::<DocumentType>().map_err(|_| {
                AppError::validation(format!("Tipo de documento inválido: {}", raw))
            })?),
            None => None,
        };
        Ok(DocumentFilter {
            document_type,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

fn caller_patient_id(user: &AuthUser) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::validation("Identificador de paciente inválido"))
}

#[axum::debug_handler]
pub async fn attach_document(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<AttachDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = DocumentService::new(&state);
    let document = service
        .attach_document(&user, appointment_id, request, auth.token())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "data": document }))))
}

#[axum::debug_handler]
pub async fn appointment_documents(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = DocumentService::new(&state);
    let documents = service
        .appointment_documents(&user, appointment_id, auth.token())
        .await?;

    Ok(Json(json!({ "data": documents })))
}

#[axum::debug_handler]
pub async fn my_documents(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MyDocumentsQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    require_patient(&user)?;

    let patient_id = caller_patient_id(&user)?;
    let filter = params.into_filter()?;

    let service = DocumentService::new(&state);
    let page = service
        .patient_documents(patient_id, &filter, auth.token())
        .await?;

    Ok(Json(json!({
        "data": page.data,
        "pagination": page.pagination,
    })))
}

#[axum::debug_handler]
pub async fn document_statistics(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    require_patient(&user)?;

    let patient_id = caller_patient_id(&user)?;

    let service = DocumentService::new(&state);
    let statistics = service
        .document_statistics(patient_id, auth.token())
        .await?;

    Ok(Json(json!({ "data": statistics })))
}

#[axum::debug_handler]
pub async fn download_document(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = DocumentService::new(&state);
    let (document, bytes, content_type) = service
        .download_document(&user, document_id, auth.token())
        .await?;

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.stored_filename),
        ),
    ];
    Ok((headers, bytes))
}

#[axum::debug_handler]
pub async fn delete_document(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = DocumentService::new(&state);
    service
        .delete_document(&user, document_id, auth.token())
        .await?;

    Ok(Json(json!({ "message": "Documento eliminado exitosamente" })))
}
