use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TEST_JWT_SECRET};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn rejects_request_without_token() {
    let mock_server = MockServer::start().await;
    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/proximos")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn rejects_expired_token() {
    let mock_server = MockServer::start().await;
    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));

    let token = JwtTestUtils::mint_token(
        &Uuid::new_v4().to_string(),
        "paciente",
        TEST_JWT_SECRET,
        -60,
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/proximos")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn booking_requires_patient_role() {
    let mock_server = MockServer::start().await;
    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));

    let token = JwtTestUtils::mint_token(
        &Uuid::new_v4().to_string(),
        "nutricionista",
        TEST_JWT_SECRET,
        3600,
    );
    let payload = json!({
        "nutritionist_id": Uuid::new_v4(),
        "date": "2025-09-01",
        "time": "10:00:00",
        "modality": "remote",
        "payment_method": "cash",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn get_appointment_returns_data_envelope() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::appointment_detail_row(
                &appointment_id.to_string(),
                &patient_id.to_string(),
                &Uuid::new_v4().to_string(),
                "2025-09-01",
                "10:00:00",
                "pending",
            ),
        ]))
        .mount(&mock_server)
        .await;

    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));
    let token = JwtTestUtils::patient_token(&patient_id.to_string());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{}", appointment_id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], appointment_id.to_string());
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn get_appointment_denies_foreign_patient() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::appointment_detail_row(
                &appointment_id.to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "2025-09-01",
                "10:00:00",
                "pending",
            ),
        ]))
        .mount(&mock_server)
        .await;

    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));
    let token = JwtTestUtils::patient_token(&Uuid::new_v4().to_string());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{}", appointment_id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
}

#[tokio::test]
async fn history_rejects_unknown_status_filter() {
    let mock_server = MockServer::start().await;
    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));
    let token = JwtTestUtils::patient_token(&Uuid::new_v4().to_string());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/historial?estado=archivado")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn history_returns_pagination_envelope() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/1")
                .set_body_json(vec![MockStoreResponses::appointment_detail_row(
                    &Uuid::new_v4().to_string(),
                    &patient_id.to_string(),
                    &Uuid::new_v4().to_string(),
                    "2025-08-01",
                    "09:00:00",
                    "completed",
                )]),
        )
        .mount(&mock_server)
        .await;

    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));
    let token = JwtTestUtils::patient_token(&patient_id.to_string());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/historial?estado=completed&limit=10")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["has_next"], false);
    assert_eq!(body["pagination"]["has_prev"], false);
}

#[tokio::test]
async fn booking_rejects_oversized_reason() {
    let mock_server = MockServer::start().await;
    let app = appointment_routes(Arc::new(TestConfig::with_store_url(&mock_server.uri())));
    let token = JwtTestUtils::patient_token(&Uuid::new_v4().to_string());

    let payload = json!({
        "nutritionist_id": Uuid::new_v4(),
        "date": "2025-09-01",
        "time": "10:00:00",
        "modality": "remote",
        "payment_method": "cash",
        "reason": "x".repeat(501),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
