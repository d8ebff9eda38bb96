// libs/patient-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use appointment_cell::models::{AppointmentFilter, AppointmentStatus};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::UpdatePatientRequest;
use crate::services::profile::PatientService;

#[derive(Debug, Deserialize)]
pub struct PatientAppointmentsQuery {
    /// Comma-separated status list.
    pub estado: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[axum::debug_handler]
pub async fn get_patient_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PatientService::new(&state);
    let patient = service
        .get_patient(&user, patient_id, auth.token())
        .await?;

    Ok(Json(json!({ "data": patient })))
}

#[axum::debug_handler]
pub async fn update_patient_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = PatientService::new(&state);
    let patient = service
        .update_patient(&user, patient_id, request, auth.token())
        .await?;

    Ok(Json(json!({ "data": patient })))
}

#[axum::debug_handler]
pub async fn linked_nutritionists(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PatientService::new(&state);
    let nutritionists = service
        .linked_nutritionists(&user, patient_id, auth.token())
        .await?;

    Ok(Json(json!({ "data": nutritionists })))
}

#[axum::debug_handler]
pub async fn activity_summary(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PatientService::new(&state);
    let summary = service
        .activity_summary(&user, patient_id, auth.token())
        .await?;

    Ok(Json(json!({ "data": summary })))
}

#[axum::debug_handler]
pub async fn patient_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
    Query(params): Query<PatientAppointmentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    if !user.can_access(&patient_id.to_string()) {
        return Err(AppError::forbidden(
            "ACCESS_DENIED",
            "No tienes permisos para acceder a este paciente",
        ));
    }

    let patient_service = PatientService::new(&state);
    patient_service
        .verify_patient_exists(patient_id, auth.token())
        .await?;

    let mut statuses = Vec::new();
    if let Some(raw) = &params.estado {
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let status: AppointmentStatus = part
                .parse()
                .map_err(|_| AppError::validation(format!("Estado inválido: {}", part)))?;
            statuses.push(status);
        }
    }
    let filter = AppointmentFilter {
        statuses,
        limit: params.limit,
        offset: params.offset,
    };

    let booking_service = AppointmentBookingService::new(&state);
    let page = booking_service
        .list_for_patient(&user, patient_id, &filter, auth.token())
        .await?;

    Ok(Json(json!({
        "data": page.data,
        "pagination": page.pagination,
    })))
}
