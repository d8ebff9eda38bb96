// libs/appointment-cell/src/services/linkage.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{DbError, SupabaseClient};

use crate::models::AppointmentError;

/// Maintains the patient/nutritionist relationship rows that get created
/// as a side effect of booking. Best-effort: callers run this off the
/// request path and only log failures.
pub struct LinkageService {
    supabase: Arc<SupabaseClient>,
}

impl LinkageService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Create an active link between the patient and the nutritionist if one
    /// does not already exist. Idempotent: a pre-existing active link (or a
    /// concurrent insert of one) leaves the table unchanged.
    pub async fn ensure_link(
        &self,
        patient_id: Uuid,
        nutritionist_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/patient_nutritionist_links?patient_id=eq.{}&nutritionist_id=eq.{}&active=eq.true&select=id",
            patient_id, nutritionist_id
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if !existing.is_empty() {
            debug!(
                "Active link already exists between patient {} and nutritionist {}",
                patient_id, nutritionist_id
            );
            return Ok(());
        }

        let link_data = json!({
            "patient_id": patient_id,
            "nutritionist_id": nutritionist_id,
            "started_at": Utc::now().to_rfc3339(),
            "active": true,
        });

        let result: Result<Vec<Value>, DbError> = self
            .supabase
            .insert_returning("/rest/v1/patient_nutritionist_links", Some(auth_token), link_data)
            .await;

        match result {
            Ok(_) => {
                info!(
                    "Linked patient {} with nutritionist {}",
                    patient_id, nutritionist_id
                );
                Ok(())
            }
            // Lost the race against another booking; the link is there.
            Err(DbError::Conflict(_)) => Ok(()),
            Err(e) => Err(AppointmentError::Database(e.to_string())),
        }
    }
}
