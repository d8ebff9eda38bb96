use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nutritionist_cell::models::{NutritionistError, NutritionistSearchFilters};
use nutritionist_cell::services::profile::NutritionistService;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

#[tokio::test]
async fn search_returns_page_of_active_nutritionists() {
    let mock_server = MockServer::start().await;

    let rows = vec![
        MockStoreResponses::nutritionist_summary_row(&Uuid::new_v4().to_string()),
        MockStoreResponses::nutritionist_summary_row(&Uuid::new_v4().to_string()),
    ];
    Mock::given(method("GET"))
        .and(path("/rest/v1/nutritionists"))
        .and(query_param("active", "eq.true"))
        .and(query_param("order", "rating.desc,review_count.desc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-1/2")
                .set_body_json(rows),
        )
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = NutritionistService::new(&config);

    let page = service
        .search(&NutritionistSearchFilters::default(), "token")
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.pagination.total, 2);
    assert!(!page.pagination.has_next);
}

#[tokio::test]
async fn search_forwards_rating_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/nutritionists"))
        .and(query_param("rating", "gte.4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "*/0")
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = NutritionistService::new(&config);

    let filters = NutritionistSearchFilters {
        min_rating: Some(4.0),
        ..Default::default()
    };
    let page = service.search(&filters, "token").await.unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total, 0);
}

#[tokio::test]
async fn profile_includes_attention_hours_monday_first() {
    let mock_server = MockServer::start().await;
    let nutritionist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/nutritionists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::nutritionist_row(&nutritionist_id.to_string()),
        ]))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/attention_hours"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "weekday": "wednesday", "start_time": "14:00:00", "end_time": "18:00:00" },
            { "weekday": "monday", "start_time": "09:00:00", "end_time": "13:00:00" },
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = NutritionistService::new(&config);

    let profile = service.get_profile(nutritionist_id, "token").await.unwrap();

    assert_eq!(profile.nutritionist.id, nutritionist_id);
    assert_eq!(profile.attention_hours.len(), 2);
    assert_eq!(profile.attention_hours[0].weekday, "monday");
    assert_eq!(
        profile.attention_hours[0].start_time,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn unknown_nutritionist_reads_as_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/nutritionists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = NutritionistService::new(&config);

    let result = service.get_profile(Uuid::new_v4(), "token").await;
    assert_matches!(result, Err(NutritionistError::NotFound));
}

#[tokio::test]
async fn availability_probe_reports_free_slot() {
    let mock_server = MockServer::start().await;
    let nutritionist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/nutritionists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::nutritionist_row(&nutritionist_id.to_string()),
        ]))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(pending,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = NutritionistService::new(&config);

    let disponible = service
        .check_availability(
            nutritionist_id,
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            "token",
        )
        .await
        .unwrap();

    assert!(disponible);
}

#[tokio::test]
async fn availability_probe_reports_occupied_slot() {
    let mock_server = MockServer::start().await;
    let nutritionist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/nutritionists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::nutritionist_row(&nutritionist_id.to_string()),
        ]))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])),
        )
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let service = NutritionistService::new(&config);

    let disponible = service
        .check_availability(
            nutritionist_id,
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            "token",
        )
        .await
        .unwrap();

    assert!(!disponible);
}
