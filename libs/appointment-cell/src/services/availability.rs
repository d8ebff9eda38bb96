// libs/appointment-cell/src/services/availability.rs
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// A slot is free iff no active (pending or confirmed) appointment exists
    /// for the nutritionist at exactly that date and time. `exclude` lets a
    /// reschedule ignore the appointment being moved.
    pub async fn is_available(
        &self,
        nutritionist_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking availability for nutritionist {} at {} {}",
            nutritionist_id, date, time
        );

        let mut path = format!(
            "/rest/v1/appointments?nutritionist_id=eq.{}&date=eq.{}&time=eq.{}&status={}&select=id",
            nutritionist_id,
            date.format("%Y-%m-%d"),
            time.format("%H:%M:%S"),
            AppointmentStatus::ACTIVE_FILTER,
        );
        if let Some(exclude_id) = exclude {
            path.push_str(&format!("&id=neq.{}", exclude_id));
        }

        let occupied: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(occupied.is_empty())
    }
}
