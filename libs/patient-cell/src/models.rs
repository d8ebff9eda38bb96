// libs/patient-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::NutritionistSummary;
use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl UpdatePatientRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

/// A nutritionist the patient has an active link with, as produced by the
/// booking side effect. Newest link first in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedNutritionist {
    pub started_at: DateTime<Utc>,
    pub nutritionist: NutritionistSummary,
}

/// Activity counters for one patient across appointments, documents and
/// linked nutritionists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub pending_appointments: i64,
    pub confirmed_appointments: i64,
    pub completed_appointments: i64,
    pub cancelled_appointments: i64,
    pub total_documents: i64,
    pub linked_nutritionists: i64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Caller may not access this patient")]
    AccessDenied,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for PatientError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(msg) => PatientError::Duplicate(msg),
            other => PatientError::Database(other.to_string()),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(e: PatientError) -> Self {
        match e {
            PatientError::NotFound => {
                AppError::not_found("PATIENT_NOT_FOUND", "Paciente no encontrado")
            }
            PatientError::AccessDenied => AppError::forbidden(
                "ACCESS_DENIED",
                "No tienes permisos para acceder a este paciente",
            ),
            PatientError::Validation(msg) => AppError::validation(msg),
            PatientError::Duplicate(_) => {
                AppError::conflict("DUPLICATE_ENTRY", "El registro ya existe")
            }
            PatientError::Database(msg) => AppError::Internal(msg),
        }
    }
}
