// libs/document-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

pub use shared_models::pagination::{Page, Pagination};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Uuid,
    pub stored_filename: String,
    pub title: String,
    pub url: String,
    pub document_type: DocumentType,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Analysis,
    MealPlan,
    MedicalReport,
    Photo,
    Other,
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(DocumentType::Analysis),
            "meal_plan" => Ok(DocumentType::MealPlan),
            "medical_report" => Ok(DocumentType::MedicalReport),
            "photo" => Ok(DocumentType::Photo),
            "other" => Ok(DocumentType::Other),
            other => Err(format!("unknown document type: {}", other)),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentType::Analysis => "analysis",
            DocumentType::MealPlan => "meal_plan",
            DocumentType::MedicalReport => "medical_report",
            DocumentType::Photo => "photo",
            DocumentType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachDocumentRequest {
    pub title: String,
    pub document_type: DocumentType,
    /// MIME type of the payload, drives the stored extension.
    pub content_type: String,
    /// Base64 payload, with or without a `data:...;base64,` prefix.
    pub file: String,
}

/// Per-type slice of a patient's document statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTypeStat {
    pub document_type: DocumentType,
    pub count: i64,
    pub total_bytes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatistics {
    pub by_type: Vec<DocumentTypeStat>,
    pub total_documents: i64,
    pub total_bytes: i64,
}

/// Listing window for a patient's own documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub document_type: Option<DocumentType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl DocumentFilter {
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
pub enum DocumentError {
    #[error("Document not found")]
    NotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Document record exists but the stored file is missing")]
    FileMissing,

    #[error("Caller may not access this document")]
    AccessDenied,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for DocumentError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(msg) => DocumentError::Duplicate(msg),
            other => DocumentError::Database(other.to_string()),
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::NotFound => {
                AppError::not_found("DOCUMENT_NOT_FOUND", "Documento no encontrado")
            }
            DocumentError::AppointmentNotFound => {
                AppError::not_found("APPOINTMENT_NOT_FOUND", "Turno no encontrado")
            }
            DocumentError::FileMissing => AppError::not_found(
                "DOCUMENT_FILE_MISSING",
                "Archivo no encontrado en el almacenamiento",
            ),
            DocumentError::AccessDenied => AppError::forbidden(
                "ACCESS_DENIED",
                "No tienes permisos para acceder a este documento",
            ),
            DocumentError::Validation(msg) => AppError::validation(msg),
            DocumentError::Duplicate(_) => {
                AppError::conflict("DUPLICATE_ENTRY", "El registro ya existe")
            }
            DocumentError::Database(msg) => AppError::Internal(msg),
        }
    }
}
