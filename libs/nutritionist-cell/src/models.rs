// libs/nutritionist-cell/src/models.rs
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;

pub use shared_models::pagination::{Page, Pagination};

/// Full nutritionist row. Maintained outside this service; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nutritionist {
    pub id: uuid::Uuid,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub specialties: Vec<String>,
    pub modalities: Vec<String>,
    pub rating: Option<f32>,
    pub review_count: Option<i32>,
    pub photo_url: Option<String>,
    pub active: bool,
    pub years_of_experience: Option<i32>,
    pub bio: Option<String>,
}

/// Projection returned by search listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionistSummary {
    pub id: uuid::Uuid,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub specialties: Vec<String>,
    pub modalities: Vec<String>,
    pub rating: Option<f32>,
    pub review_count: Option<i32>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionHour {
    pub weekday: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Full profile: the row plus its weekly attention hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionistProfile {
    #[serde(flatten)]
    pub nutritionist: Nutritionist,
    pub attention_hours: Vec<AttentionHour>,
}

#[derive(Debug, Clone, Default)]
pub struct NutritionistSearchFilters {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub modality: Option<String>,
    pub min_rating: Option<f32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl NutritionistSearchFilters {
    pub const MAX_LIMIT: i64 = 100;
    pub const DEFAULT_LIMIT: i64 = 20;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum NutritionistError {
    #[error("Nutritionist not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<NutritionistError> for AppError {
    fn from(e: NutritionistError) -> Self {
        match e {
            NutritionistError::NotFound => {
                AppError::not_found("NUTRITIONIST_NOT_FOUND", "Nutricionista no encontrado")
            }
            NutritionistError::Validation(msg) => AppError::validation(msg),
            NutritionistError::Database(msg) => AppError::Internal(msg),
        }
    }
}
