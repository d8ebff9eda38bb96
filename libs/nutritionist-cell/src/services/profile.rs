// libs/nutritionist-cell/src/services/profile.rs
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    AttentionHour, Nutritionist, NutritionistError, NutritionistProfile,
    NutritionistSearchFilters, NutritionistSummary, Page, Pagination,
};

const SUMMARY_SELECT: &str =
    "id,first_name,last_name,license_number,specialties,modalities,rating,review_count,photo_url";

/// Statuses that occupy a slot, as a PostgREST filter.
const ACTIVE_FILTER: &str = "in.(pending,confirmed)";

const WEEKDAY_ORDER: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub struct NutritionistService {
    supabase: SupabaseClient,
}

impl NutritionistService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Search active nutritionists, best rated first.
    pub async fn search(
        &self,
        filters: &NutritionistSearchFilters,
        auth_token: &str,
    ) -> Result<Page<NutritionistSummary>, NutritionistError> {
        debug!("Searching nutritionists with filters: {:?}", filters);

        let mut query_parts = vec!["active=eq.true".to_string()];

        if let Some(name) = &filters.name {
            let pattern = urlencoding::encode(name).into_owned();
            query_parts.push(format!(
                "or=(first_name.ilike.*{}*,last_name.ilike.*{}*)",
                pattern, pattern
            ));
        }
        if let Some(specialty) = &filters.specialty {
            query_parts.push(format!(
                "specialties=cs.{{{}}}",
                urlencoding::encode(specialty)
            ));
        }
        if let Some(modality) = &filters.modality {
            query_parts.push(format!(
                "modalities=cs.{{{}}}",
                urlencoding::encode(modality)
            ));
        }
        if let Some(min_rating) = filters.min_rating {
            query_parts.push(format!("rating=gte.{}", min_rating));
        }

        let limit = filters.effective_limit();
        let offset = filters.effective_offset();
        let path = format!(
            "/rest/v1/nutritionists?{}&select={}&order=rating.desc,review_count.desc&limit={}&offset={}",
            query_parts.join("&"),
            SUMMARY_SELECT,
            limit,
            offset,
        );

        let (rows, total) = self
            .supabase
            .request_with_count::<NutritionistSummary>(&path, Some(auth_token))
            .await
            .map_err(|e| NutritionistError::Database(e.to_string()))?;

        Ok(Page {
            data: rows,
            pagination: Pagination::new(total, limit, offset),
        })
    }

    /// Full profile with the weekly attention hours attached. Inactive rows
    /// read as absent.
    pub async fn get_profile(
        &self,
        nutritionist_id: Uuid,
        auth_token: &str,
    ) -> Result<NutritionistProfile, NutritionistError> {
        debug!("Fetching nutritionist profile: {}", nutritionist_id);

        let nutritionist = self.fetch_active(nutritionist_id, auth_token).await?;
        let attention_hours = self.fetch_attention_hours(nutritionist_id, auth_token).await?;

        Ok(NutritionistProfile {
            nutritionist,
            attention_hours,
        })
    }

    /// Weekly attention hours, Monday first.
    pub async fn attention_hours(
        &self,
        nutritionist_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AttentionHour>, NutritionistError> {
        self.fetch_active(nutritionist_id, auth_token).await?;
        self.fetch_attention_hours(nutritionist_id, auth_token).await
    }

    /// True iff no active appointment occupies the slot.
    pub async fn check_availability(
        &self,
        nutritionist_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool, NutritionistError> {
        self.fetch_active(nutritionist_id, auth_token).await?;

        let path = format!(
            "/rest/v1/appointments?nutritionist_id=eq.{}&date=eq.{}&time=eq.{}&status={}&select=id",
            nutritionist_id,
            date.format("%Y-%m-%d"),
            time.format("%H:%M:%S"),
            ACTIVE_FILTER,
        );
        let occupied: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NutritionistError::Database(e.to_string()))?;

        Ok(occupied.is_empty())
    }

    async fn fetch_active(
        &self,
        nutritionist_id: Uuid,
        auth_token: &str,
    ) -> Result<Nutritionist, NutritionistError> {
        let path = format!(
            "/rest/v1/nutritionists?id=eq.{}&active=eq.true",
            nutritionist_id
        );
        let result: Vec<Nutritionist> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NutritionistError::Database(e.to_string()))?;

        result.into_iter().next().ok_or(NutritionistError::NotFound)
    }

    async fn fetch_attention_hours(
        &self,
        nutritionist_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AttentionHour>, NutritionistError> {
        let path = format!(
            "/rest/v1/attention_hours?nutritionist_id=eq.{}&select=weekday,start_time,end_time",
            nutritionist_id
        );
        let mut hours: Vec<AttentionHour> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NutritionistError::Database(e.to_string()))?;

        hours.sort_by_key(|h| weekday_rank(&h.weekday));
        Ok(hours)
    }
}

fn weekday_rank(weekday: &str) -> usize {
    WEEKDAY_ORDER
        .iter()
        .position(|d| *d == weekday)
        .unwrap_or(WEEKDAY_ORDER.len())
}
