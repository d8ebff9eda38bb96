use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::models::{PatientError, UpdatePatientRequest};
use patient_cell::services::profile::PatientService;
use shared_models::auth::{AuthUser, Role};
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn patient_user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some("paciente@example.com".to_string()),
        role: Role::Paciente,
        authenticated_at: Some(chrono::Utc::now()),
    }
}

fn admin_user() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4().to_string(),
        email: Some("admin@example.com".to_string()),
        role: Role::Admin,
        authenticated_at: Some(chrono::Utc::now()),
    }
}

#[tokio::test]
async fn patient_reads_own_profile() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::patient_row(&patient_id.to_string(), "Ana"),
        ]))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&patient_id.to_string());

    let patient = service
        .get_patient(&caller, patient_id, "token")
        .await
        .unwrap();
    assert_eq!(patient.id, patient_id);
    assert_eq!(patient.first_name, "Ana");
}

#[tokio::test]
async fn foreign_patient_profile_is_denied_without_store_roundtrip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&Uuid::new_v4().to_string());

    let result = service.get_patient(&caller, Uuid::new_v4(), "token").await;
    assert_matches!(result, Err(PatientError::AccessDenied));
}

#[tokio::test]
async fn admin_reads_any_profile() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::patient_row(&patient_id.to_string(), "Ana"),
        ]))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);

    let patient = service
        .get_patient(&admin_user(), patient_id, "token")
        .await
        .unwrap();
    assert_eq!(patient.id, patient_id);
}

#[tokio::test]
async fn update_rejects_empty_payload() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&patient_id.to_string());

    let result = service
        .update_patient(
            &caller,
            patient_id,
            UpdatePatientRequest {
                first_name: None,
                last_name: None,
                phone: None,
            },
            "token",
        )
        .await;

    assert_matches!(result, Err(PatientError::Validation(_)));
}

#[tokio::test]
async fn update_patches_provided_fields() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    let mut updated = MockStoreResponses::patient_row(&patient_id.to_string(), "Ana");
    updated["phone"] = json!("+54 11 5555-0002");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![updated]))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&patient_id.to_string());

    let patient = service
        .update_patient(
            &caller,
            patient_id,
            UpdatePatientRequest {
                first_name: None,
                last_name: None,
                phone: Some("+54 11 5555-0002".to_string()),
            },
            "token",
        )
        .await
        .unwrap();

    assert_eq!(patient.phone.as_deref(), Some("+54 11 5555-0002"));
}

#[tokio::test]
async fn missing_patient_reads_as_not_found() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&patient_id.to_string());

    let result = service.get_patient(&caller, patient_id, "token").await;
    assert_matches!(result, Err(PatientError::NotFound));
}

#[tokio::test]
async fn lists_linked_nutritionists_newest_first() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let nutritionist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_nutritionist_links"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("active", "eq.true"))
        .and(query_param("order", "started_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "started_at": "2025-02-01T09:30:00Z",
                "nutritionist": MockStoreResponses::nutritionist_summary_row(
                    &nutritionist_id.to_string()
                ),
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&patient_id.to_string());

    let linked = service
        .linked_nutritionists(&caller, patient_id, "token")
        .await
        .unwrap();

    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].nutritionist.id, nutritionist_id);
    assert_eq!(linked[0].nutritionist.first_name, "Laura");
}

#[tokio::test]
async fn linked_nutritionists_denied_for_foreign_caller() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_nutritionist_links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&Uuid::new_v4().to_string());

    let result = service
        .linked_nutritionists(&caller, Uuid::new_v4(), "token")
        .await;
    assert_matches!(result, Err(PatientError::AccessDenied));
}

#[tokio::test]
async fn activity_summary_aggregates_counters() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": patient_id }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "status": "pending" },
            { "status": "pending" },
            { "status": "completed" },
            { "status": "cancelled" },
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/documents"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/7")
                .set_body_json(json!([{ "id": Uuid::new_v4() }])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_nutritionist_links"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/2")
                .set_body_json(json!([{ "id": 1 }])),
        )
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&patient_id.to_string());

    let summary = service
        .activity_summary(&caller, patient_id, "token")
        .await
        .unwrap();

    assert_eq!(summary.pending_appointments, 2);
    assert_eq!(summary.confirmed_appointments, 0);
    assert_eq!(summary.completed_appointments, 1);
    assert_eq!(summary.cancelled_appointments, 1);
    assert_eq!(summary.total_documents, 7);
    assert_eq!(summary.linked_nutritionists, 2);
}

#[tokio::test]
async fn activity_summary_requires_existing_patient() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = PatientService::new(&config);
    let caller = patient_user(&patient_id.to_string());

    let result = service.activity_summary(&caller, patient_id, "token").await;
    assert_matches!(result, Err(PatientError::NotFound));
}
