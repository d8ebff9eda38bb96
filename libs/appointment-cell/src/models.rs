// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub nutritionist_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub modality: Modality,
    pub status: AppointmentStatus,
    pub payment_method: PaymentMethod,
    pub reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    // Present in the wire format; no operation in this service sets it.
    Rescheduled,
}

impl AppointmentStatus {
    /// Active appointments are the ones that occupy a slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    /// Only active appointments may be cancelled.
    pub fn can_cancel(&self) -> bool {
        self.is_active()
    }

    /// PostgREST filter expression matching the active statuses.
    pub const ACTIVE_FILTER: &'static str = "in.(pending,confirmed)";
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Rescheduled => "rescheduled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            "rescheduled" => Ok(AppointmentStatus::Rescheduled),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Remote,
    Hybrid,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modality::InPerson => "in_person",
            Modality::Remote => "remote",
            Modality::Hybrid => "hybrid",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    CreditCard,
    DebitCard,
    MercadoPago,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::MercadoPago => "mercado_pago",
        };
        write!(f, "{}", s)
    }
}

// ==============================================================================
// JOINED DETAIL MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionistSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub specialties: Vec<String>,
    pub modalities: Vec<String>,
    pub rating: Option<f32>,
    pub review_count: Option<i32>,
    pub photo_url: Option<String>,
}

/// Appointment row joined with the denormalized display fields the API
/// returns. The embedded records are optional because list queries only
/// embed the nutritionist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<PatientSummary>,
    pub nutritionist: Option<NutritionistSummary>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub nutritionist_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub modality: Modality,
    pub payment_method: PaymentMethod,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
    #[serde(default = "default_notify")]
    pub notify_nutritionist: bool,
}

fn default_notify() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub modality: Option<Modality>,
}

/// Status filter plus pagination window for listing operations.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub statuses: Vec<AppointmentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AppointmentFilter {
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

pub use shared_models::pagination::{Page, Pagination};

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Nutritionist not found")]
    NutritionistNotFound,

    #[error("Appointment slot not available")]
    SlotUnavailable,

    #[error("New schedule not available")]
    NewScheduleNotAvailable,

    #[error("Appointment cannot be cancelled in its current status")]
    CannotCancel,

    #[error("Caller may not access this appointment")]
    AccessDenied,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for AppointmentError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(msg) => AppointmentError::Duplicate(msg),
            other => AppointmentError::Database(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound => {
                AppError::not_found("APPOINTMENT_NOT_FOUND", "Turno no encontrado")
            }
            AppointmentError::NutritionistNotFound => {
                AppError::not_found("NUTRITIONIST_NOT_FOUND", "Nutricionista no encontrado")
            }
            AppointmentError::SlotUnavailable => AppError::conflict(
                "APPOINTMENT_NOT_AVAILABLE",
                "El horario seleccionado no está disponible",
            ),
            AppointmentError::NewScheduleNotAvailable => AppError::conflict(
                "NEW_SCHEDULE_NOT_AVAILABLE",
                "El nuevo horario no está disponible",
            ),
            AppointmentError::CannotCancel => AppError::conflict(
                "APPOINTMENT_CANNOT_BE_CANCELLED",
                "El turno no puede ser cancelado",
            ),
            AppointmentError::AccessDenied => AppError::forbidden(
                "ACCESS_DENIED",
                "No tienes permisos para acceder a este turno",
            ),
            AppointmentError::Validation(msg) => AppError::validation(msg),
            AppointmentError::Duplicate(_) => {
                AppError::conflict("DUPLICATE_ENTRY", "El registro ya existe")
            }
            AppointmentError::Database(msg) => AppError::Internal(msg),
        }
    }
}
