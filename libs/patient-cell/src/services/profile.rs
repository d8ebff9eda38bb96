// libs/patient-cell/src/services/profile.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::AuthUser;

use appointment_cell::models::AppointmentStatus;

use crate::models::{
    ActivitySummary, LinkedNutritionist, Patient, PatientError, UpdatePatientRequest,
};

/// Embed expression for the linked-nutritionists listing.
const LINKED_SELECT: &str = "started_at,nutritionist:nutritionists(id,first_name,last_name,license_number,specialties,modalities,rating,review_count,photo_url)";

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Profile read, visible to the patient themselves and to admins.
    pub async fn get_patient(
        &self,
        caller: &AuthUser,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        self.authorize(caller, patient_id)?;

        debug!("Fetching patient profile: {}", patient_id);
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Patient> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }

    /// Partial profile update. Email is identity-bound and not editable here.
    pub async fn update_patient(
        &self,
        caller: &AuthUser,
        patient_id: Uuid,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        self.authorize(caller, patient_id)?;

        if request.is_empty() {
            return Err(PatientError::Validation(
                "No hay campos para actualizar".to_string(),
            ));
        }

        let mut update_data = serde_json::Map::new();
        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Patient> = self
            .supabase
            .update_returning(&path, Some(auth_token), Value::Object(update_data))
            .await?;

        let patient = result.into_iter().next().ok_or(PatientError::NotFound)?;
        info!("Patient profile {} updated", patient_id);
        Ok(patient)
    }

    /// Nutritionists the patient has an active link with, newest first.
    /// Links are written as a booking side effect; this is their read side.
    pub async fn linked_nutritionists(
        &self,
        caller: &AuthUser,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<LinkedNutritionist>, PatientError> {
        self.authorize(caller, patient_id)?;

        debug!("Listing linked nutritionists for patient: {}", patient_id);
        let path = format!(
            "/rest/v1/patient_nutritionist_links?patient_id=eq.{}&active=eq.true&select={}&order=started_at.desc",
            patient_id, LINKED_SELECT
        );
        let links: Vec<LinkedNutritionist> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(links)
    }

    /// Activity counters across appointments, documents and links.
    pub async fn activity_summary(
        &self,
        caller: &AuthUser,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<ActivitySummary, PatientError> {
        self.authorize(caller, patient_id)?;
        self.verify_patient_exists(patient_id, auth_token).await?;

        #[derive(serde::Deserialize)]
        struct StatusRow {
            status: AppointmentStatus,
        }

        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&select=status",
            patient_id
        );
        let statuses: Vec<StatusRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let count_of = |wanted: AppointmentStatus| {
            statuses.iter().filter(|row| row.status == wanted).count() as i64
        };

        let (_, total_documents) = self
            .supabase
            .request_with_count::<Value>(
                &format!(
                    "/rest/v1/documents?patient_id=eq.{}&select=id&limit=1",
                    patient_id
                ),
                Some(auth_token),
            )
            .await?;

        let (_, linked_nutritionists) = self
            .supabase
            .request_with_count::<Value>(
                &format!(
                    "/rest/v1/patient_nutritionist_links?patient_id=eq.{}&active=eq.true&select=id&limit=1",
                    patient_id
                ),
                Some(auth_token),
            )
            .await?;

        Ok(ActivitySummary {
            pending_appointments: count_of(AppointmentStatus::Pending),
            confirmed_appointments: count_of(AppointmentStatus::Confirmed),
            completed_appointments: count_of(AppointmentStatus::Completed),
            cancelled_appointments: count_of(AppointmentStatus::Cancelled),
            total_documents,
            linked_nutritionists,
        })
    }

    /// Existence check used before listing a patient's appointments.
    pub async fn verify_patient_exists(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<(), PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}&select=id", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(PatientError::NotFound);
        }
        Ok(())
    }

    fn authorize(&self, caller: &AuthUser, patient_id: Uuid) -> Result<(), PatientError> {
        if caller.can_access(&patient_id.to_string()) {
            Ok(())
        } else {
            warn!("User {} denied access to patient {}", caller.id, patient_id);
            Err(PatientError::AccessDenied)
        }
    }
}
