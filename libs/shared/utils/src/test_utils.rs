//! Helpers shared by the cells' wiremock-based tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use shared_config::AppConfig;

pub const TEST_JWT_SECRET: &str = "nutrito-test-secret";

pub struct TestConfig;

impl TestConfig {
    /// Config pointing the persistence gateway at a wiremock server.
    pub fn with_store_url(store_url: &str) -> AppConfig {
        AppConfig {
            supabase_url: store_url.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            document_bucket: "patient-documents".to_string(),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Mint an HS256 token for tests. `ttl_secs` may be negative to produce
    /// an already-expired token.
    pub fn mint_token(sub: &str, tipo: &str, secret: &str, ttl_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let claims = json!({
            "sub": sub,
            "tipo": tipo,
            "email": format!("{}@example.com", sub),
            "iat": now,
            "exp": now + ttl_secs,
        });

        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }

    pub fn patient_token(patient_id: &str) -> String {
        Self::mint_token(patient_id, "paciente", TEST_JWT_SECRET, 3600)
    }

    pub fn admin_token(admin_id: &str) -> String {
        Self::mint_token(admin_id, "admin", TEST_JWT_SECRET, 3600)
    }
}

/// Canned PostgREST row payloads matching the store schema.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn appointment_row(
        id: &str,
        patient_id: &str,
        nutritionist_id: &str,
        date: &str,
        time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "nutritionist_id": nutritionist_id,
            "date": date,
            "time": time,
            "modality": "remote",
            "status": status,
            "payment_method": "mercado_pago",
            "reason": "Primera consulta",
            "cancellation_reason": null,
            "created_at": "2025-01-15T12:00:00Z",
            "updated_at": "2025-01-15T12:00:00Z",
        })
    }

    pub fn appointment_detail_row(
        id: &str,
        patient_id: &str,
        nutritionist_id: &str,
        date: &str,
        time: &str,
        status: &str,
    ) -> Value {
        let mut row = Self::appointment_row(id, patient_id, nutritionist_id, date, time, status);
        row["patient"] = json!({
            "id": patient_id,
            "first_name": "Ana",
            "last_name": "García",
            "email": "ana@example.com",
            "phone": "+54 11 5555-0001",
        });
        row["nutritionist"] = Self::nutritionist_summary_row(nutritionist_id);
        row
    }

    pub fn nutritionist_summary_row(id: &str) -> Value {
        json!({
            "id": id,
            "first_name": "Laura",
            "last_name": "Pérez",
            "license_number": "MN-12345",
            "specialties": ["clinical_nutrition", "diabetes"],
            "modalities": ["in_person", "remote"],
            "rating": 4.7,
            "review_count": 31,
            "photo_url": null,
        })
    }

    pub fn nutritionist_row(id: &str) -> Value {
        let mut row = Self::nutritionist_summary_row(id);
        row["active"] = json!(true);
        row["years_of_experience"] = json!(8);
        row["bio"] = json!("Especialista en nutrición clínica.");
        row
    }

    pub fn patient_row(id: &str, first_name: &str) -> Value {
        json!({
            "id": id,
            "first_name": first_name,
            "last_name": "García",
            "email": format!("{}@example.com", first_name.to_lowercase()),
            "phone": "+54 11 5555-0001",
        })
    }

    pub fn link_row(patient_id: &str, nutritionist_id: &str) -> Value {
        json!({
            "id": 1,
            "patient_id": patient_id,
            "nutritionist_id": nutritionist_id,
            "started_at": "2025-01-15T12:00:00Z",
            "active": true,
        })
    }

    pub fn document_row(id: &str, patient_id: &str, appointment_id: &str) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "appointment_id": appointment_id,
            "stored_filename": format!("{}.pdf", id),
            "title": "Análisis de sangre",
            "url": format!("/storage/v1/object/public/patient-documents/{}/{}.pdf", patient_id, id),
            "document_type": "analysis",
            "size_bytes": 24576,
            "uploaded_at": "2025-01-15T12:00:00Z",
        })
    }
}
