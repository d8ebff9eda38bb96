// libs/appointment-cell/src/services/booking.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};
use shared_models::auth::AuthUser;

use crate::models::{
    Appointment, AppointmentDetail, AppointmentError, AppointmentFilter, AppointmentStatus,
    BookAppointmentRequest, CancelAppointmentRequest, Page, Pagination,
    RescheduleAppointmentRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::linkage::LinkageService;

/// Embed expression for a full appointment detail (both parties joined).
const DETAIL_SELECT: &str = "*,patient:patients(id,first_name,last_name,email,phone),nutritionist:nutritionists(id,first_name,last_name,license_number,specialties,modalities,rating,review_count,photo_url)";

/// Embed expression for listings. Only the nutritionist side is joined; the
/// caller already is (or administers) the patient.
const LIST_SELECT: &str = "*,nutritionist:nutritionists(id,first_name,last_name,license_number,specialties,modalities,rating,review_count,photo_url)";

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    availability_service: AvailabilityService,
    linkage_service: Arc<LinkageService>,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let availability_service = AvailabilityService::new(Arc::clone(&supabase));
        let linkage_service = Arc::new(LinkageService::new(Arc::clone(&supabase)));

        Self {
            supabase,
            availability_service,
            linkage_service,
        }
    }

    /// Book a new appointment for the calling patient. The slot is checked
    /// before inserting, and the insert itself runs against a unique
    /// constraint on (nutritionist_id, date, time) over active rows, so a
    /// concurrent booking of the same slot surfaces as a conflict rather
    /// than a double booking.
    pub async fn book_appointment(
        &self,
        caller: &AuthUser,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentDetail, AppointmentError> {
        let patient_id = caller_patient_id(caller)?;
        info!(
            "Booking appointment for patient {} with nutritionist {}",
            patient_id, request.nutritionist_id
        );

        self.verify_nutritionist_exists(request.nutritionist_id, auth_token)
            .await?;

        let available = self
            .availability_service
            .is_available(request.nutritionist_id, request.date, request.time, None, auth_token)
            .await?;
        if !available {
            warn!(
                "Slot {} {} already taken for nutritionist {}",
                request.date, request.time, request.nutritionist_id
            );
            return Err(AppointmentError::SlotUnavailable);
        }

        let now = Utc::now();
        let appointment_data = json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "nutritionist_id": request.nutritionist_id,
            "date": request.date.format("%Y-%m-%d").to_string(),
            "time": request.time.format("%H:%M:%S").to_string(),
            "modality": request.modality.to_string(),
            "status": AppointmentStatus::Pending.to_string(),
            "payment_method": request.payment_method.to_string(),
            "reason": request.reason,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let result: Vec<Appointment> = self
            .supabase
            .insert_returning("/rest/v1/appointments", Some(auth_token), appointment_data)
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => AppointmentError::SlotUnavailable,
                other => AppointmentError::Database(other.to_string()),
            })?;

        let appointment = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("insert returned no row".to_string()))?;

        info!(
            "Appointment {} booked for patient {} with nutritionist {}",
            appointment.id, patient_id, appointment.nutritionist_id
        );

        // Linkage runs off the request path; booking never fails because of it.
        let linkage = Arc::clone(&self.linkage_service);
        let nutritionist_id = appointment.nutritionist_id;
        let token = auth_token.to_string();
        tokio::spawn(async move {
            if let Err(e) = linkage.ensure_link(patient_id, nutritionist_id, &token).await {
                warn!(
                    "Failed to link patient {} with nutritionist {}: {}",
                    patient_id, nutritionist_id, e
                );
            }
        });

        self.fetch_detail(appointment.id, auth_token).await
    }

    /// Get the joined detail for one appointment, enforcing the
    /// owner-or-admin rule.
    pub async fn get_appointment(
        &self,
        caller: &AuthUser,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentDetail, AppointmentError> {
        let detail = self.fetch_detail(appointment_id, auth_token).await?;
        self.authorize(caller, &detail.appointment)?;
        Ok(detail)
    }

    /// Cancel an appointment. The PATCH is filtered by the active statuses as
    /// well, so a row that was cancelled or completed in between comes back
    /// empty and the caller sees the same precondition error as on the read.
    pub async fn cancel_appointment(
        &self,
        caller: &AuthUser,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.fetch_row(appointment_id, auth_token).await?;
        self.authorize(caller, &current)?;

        if !current.status.can_cancel() {
            return Err(AppointmentError::CannotCancel);
        }

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status={}",
            appointment_id,
            AppointmentStatus::ACTIVE_FILTER,
        );
        let update_data = json!({
            "status": AppointmentStatus::Cancelled.to_string(),
            "cancellation_reason": request.reason,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Appointment> = self
            .supabase
            .update_returning(&path, Some(auth_token), update_data)
            .await?;

        let cancelled = result
            .into_iter()
            .next()
            .ok_or(AppointmentError::CannotCancel)?;

        if request.notify_nutritionist {
            // Notification dispatch lives outside this service.
            info!(
                "Nutritionist {} should be notified of cancellation of {}",
                cancelled.nutritionist_id, cancelled.id
            );
        }

        info!("Appointment {} cancelled", appointment_id);
        Ok(cancelled)
    }

    /// Move an appointment to a new slot with the same nutritionist. The
    /// availability check excludes the appointment itself so rescheduling to
    /// the slot it already occupies is a no-op, not a conflict. The status
    /// is left untouched.
    pub async fn reschedule_appointment(
        &self,
        caller: &AuthUser,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentDetail, AppointmentError> {
        debug!("Rescheduling appointment: {}", appointment_id);

        let current = self.fetch_row(appointment_id, auth_token).await?;
        self.authorize(caller, &current)?;

        let available = self
            .availability_service
            .is_available(
                current.nutritionist_id,
                request.date,
                request.time,
                Some(appointment_id),
                auth_token,
            )
            .await?;
        if !available {
            warn!(
                "New slot {} {} not available for appointment {}",
                request.date, request.time, appointment_id
            );
            return Err(AppointmentError::NewScheduleNotAvailable);
        }

        let mut update_data = serde_json::Map::new();
        update_data.insert(
            "date".to_string(),
            json!(request.date.format("%Y-%m-%d").to_string()),
        );
        update_data.insert(
            "time".to_string(),
            json!(request.time.format("%H:%M:%S").to_string()),
        );
        if let Some(modality) = request.modality {
            update_data.insert("modality".to_string(), json!(modality.to_string()));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self
            .supabase
            .update_returning(&path, Some(auth_token), Value::Object(update_data))
            .await?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        info!(
            "Appointment {} rescheduled to {} {}",
            appointment_id, request.date, request.time
        );
        self.fetch_detail(appointment_id, auth_token).await
    }

    /// List a patient's appointments, newest first, with an exact total for
    /// the pagination envelope.
    pub async fn list_for_patient(
        &self,
        caller: &AuthUser,
        patient_id: Uuid,
        filter: &AppointmentFilter,
        auth_token: &str,
    ) -> Result<Page<AppointmentDetail>, AppointmentError> {
        if !caller.can_access(&patient_id.to_string()) {
            return Err(AppointmentError::AccessDenied);
        }

        let limit = filter.effective_limit();
        let offset = filter.effective_offset();

        let mut path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&select={}",
            patient_id, LIST_SELECT
        );
        if !filter.statuses.is_empty() {
            let statuses: Vec<String> =
                filter.statuses.iter().map(|s| s.to_string()).collect();
            path.push_str(&format!("&status=in.({})", statuses.join(",")));
        }
        path.push_str(&format!(
            "&order=date.desc,time.desc&limit={}&offset={}",
            limit, offset
        ));

        let (rows, total) = self
            .supabase
            .request_with_count::<AppointmentDetail>(&path, Some(auth_token))
            .await?;

        Ok(Page {
            data: rows,
            pagination: Pagination::new(total, limit, offset),
        })
    }

    /// The calling patient's still-active appointments.
    pub async fn upcoming_for_caller(
        &self,
        caller: &AuthUser,
        limit: Option<i64>,
        auth_token: &str,
    ) -> Result<Page<AppointmentDetail>, AppointmentError> {
        let patient_id = caller_patient_id(caller)?;
        let filter = AppointmentFilter {
            statuses: vec![AppointmentStatus::Pending, AppointmentStatus::Confirmed],
            limit: Some(limit.unwrap_or(5)),
            offset: None,
        };
        self.list_for_patient(caller, patient_id, &filter, auth_token)
            .await
    }

    fn authorize(
        &self,
        caller: &AuthUser,
        appointment: &Appointment,
    ) -> Result<(), AppointmentError> {
        if caller.can_access(&appointment.patient_id.to_string()) {
            Ok(())
        } else {
            warn!(
                "User {} denied access to appointment {}",
                caller.id, appointment.id
            );
            Err(AppointmentError::AccessDenied)
        }
    }

    async fn verify_nutritionist_exists(
        &self,
        nutritionist_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/nutritionists?id=eq.{}&select=id",
            nutritionist_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(AppointmentError::NutritionistNotFound);
        }
        Ok(())
    }

    async fn fetch_row(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    async fn fetch_detail(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentDetail, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&select={}",
            appointment_id, DETAIL_SELECT
        );
        let result: Vec<AppointmentDetail> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result.into_iter().next().ok_or(AppointmentError::NotFound)
    }
}

fn caller_patient_id(caller: &AuthUser) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(&caller.id)
        .map_err(|_| AppointmentError::Validation("malformed subject in token".to_string()))
}
