// libs/nutritionist-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, NaiveTime};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::NutritionistSearchFilters;
use crate::services::profile::NutritionistService;

#[derive(Debug, Deserialize)]
pub struct SearchQueryParams {
    pub nombre: Option<String>,
    pub especialidad: Option<String>,
    pub modalidad: Option<String>,
    pub rating_min: Option<f32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<SearchQueryParams> for NutritionistSearchFilters {
    fn from(params: SearchQueryParams) -> Self {
        NutritionistSearchFilters {
            name: params.nombre,
            specialty: params.especialidad,
            modality: params.modalidad,
            min_rating: params.rating_min,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQueryParams {
    pub fecha: Option<NaiveDate>,
    pub hora: Option<NaiveTime>,
}

#[axum::debug_handler]
pub async fn search_nutritionists(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let service = NutritionistService::new(&state);
    let page = service.search(&params.into(), auth.token()).await?;

    Ok(Json(json!({
        "data": page.data,
        "pagination": page.pagination,
    })))
}

#[axum::debug_handler]
pub async fn get_nutritionist_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(nutritionist_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = NutritionistService::new(&state);
    let profile = service.get_profile(nutritionist_id, auth.token()).await?;

    Ok(Json(json!({ "data": profile })))
}

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(nutritionist_id): Path<Uuid>,
    Query(params): Query<AvailabilityQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let (fecha, hora) = match (params.fecha, params.hora) {
        (Some(fecha), Some(hora)) => (fecha, hora),
        _ => return Err(AppError::validation("Fecha y hora son requeridos")),
    };

    let service = NutritionistService::new(&state);
    let disponible = service
        .check_availability(nutritionist_id, fecha, hora, auth.token())
        .await?;

    Ok(Json(json!({
        "data": {
            "nutritionist_id": nutritionist_id,
            "fecha": fecha,
            "hora": hora,
            "disponible": disponible,
        }
    })))
}

#[axum::debug_handler]
pub async fn attention_hours(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(nutritionist_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = NutritionistService::new(&state);
    let hours = service
        .attention_hours(nutritionist_id, auth.token())
        .await?;

    Ok(Json(json!({ "data": hours })))
}
