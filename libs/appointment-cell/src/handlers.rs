// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
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

use crate::models::{
    AppointmentFilter, AppointmentStatus, BookAppointmentRequest, CancelAppointmentRequest,
    RescheduleAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct UpcomingQueryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQueryParams {
    /// Comma-separated status list, e.g. `cancelled,completed`.
    pub estado: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HistoryQueryParams {
    pub fn into_filter(self) -> Result<AppointmentFilter, AppError> {
        let mut statuses = Vec::new();
        if let Some(raw) = &self.estado {
            for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let status: AppointmentStatus = part
                    .parse()
                    .map_err(|_| AppError::validation(format!("Estado inválido: {}", part)))?;
                statuses.push(status);
            }
        }
        Ok(AppointmentFilter {
            statuses,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_patient(&user)?;

    if let Some(reason) = &request.reason {
        if reason.chars().count() > 500 {
            return Err(AppError::validation(
                "El motivo no puede superar los 500 caracteres",
            ));
        }
    }

    let booking_service = AppointmentBookingService::new(&state);
    let detail = booking_service
        .book_appointment(&user, request, auth.token())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "data": detail }))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let detail = booking_service
        .get_appointment(&user, appointment_id, auth.token())
        .await?;

    Ok(Json(json!({ "data": detail })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let cancelled = booking_service
        .cancel_appointment(&user, appointment_id, request, auth.token())
        .await?;

    Ok(Json(json!({ "data": cancelled })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let detail = booking_service
        .reschedule_appointment(&user, appointment_id, request, auth.token())
        .await?;

    Ok(Json(json!({ "data": detail })))
}

#[axum::debug_handler]
pub async fn upcoming_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<UpcomingQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    require_patient(&user)?;

    let booking_service = AppointmentBookingService::new(&state);
    let page = booking_service
        .upcoming_for_caller(&user, params.limit, auth.token())
        .await?;

    Ok(Json(json!({
        "data": page.data,
        "pagination": page.pagination,
    })))
}

#[axum::debug_handler]
pub async fn appointment_history(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    require_patient(&user)?;

    let patient_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::validation("Identificador de paciente inválido"))?;
    let filter = params.into_filter()?;

    let booking_service = AppointmentBookingService::new(&state);
    let page = booking_service
        .list_for_patient(&user, patient_id, &filter, auth.token())
        .await?;

    Ok(Json(json!({
        "data": page.data,
        "pagination": page.pagination,
    })))
}
