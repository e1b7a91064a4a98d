use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use base64::{engine::general_purpose, Engine as _};
use report_card_api::{config::Config, models::report_card::BatchRenderResponse};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

/// Test helper to POST a JSON body
async fn post_json(app: &axum::Router, uri: &str, body: String) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &axum::Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = common::create_test_app().await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "report-card-api");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = common::create_test_app().await;

    // Make sure at least one request has been counted
    let _ = get(&app, "/health").await;

    let response = get(&app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn test_render_single_report_card() {
    let app = common::create_test_app().await;
    let request = common::render_request(
        "Ada Mbarga",
        common::sequence_results(&[("Mathematics", Some(14.5)), ("Physics", Some(8.0))]),
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/report-cards")
                .header("content-type", "application/json")
                .header("x-trace-id", "trace-123")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report_card_Ada_Mbarga_Sequence_1.pdf\""
    );
    assert_eq!(headers["x-page-count"], "1");
    assert_eq!(headers["x-trace-id"], "trace-123");

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_trace_id_is_generated_when_absent() {
    let app = common::create_test_app().await;

    let response = get(&app, "/health").await;
    let trace_id = response.headers()["x-trace-id"].to_str().unwrap();
    assert_eq!(trace_id.len(), 36);
}

#[tokio::test]
async fn test_missing_school_is_bad_request() {
    let app = common::create_test_app().await;
    let request = json!({
        "student": common::student("Ada Mbarga"),
        "results": common::sequence_results(&[("Mathematics", Some(12.0))])
    });

    let response = post_json(&app, "/api/v1/report-cards", request.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("School information is missing"));
}

#[tokio::test]
async fn test_missing_period_type_is_bad_request() {
    let app = common::create_test_app().await;
    let mut results = common::sequence_results(&[("Mathematics", Some(12.0))]);
    results["period_type"] = Value::Null;
    let request = common::render_request("Ada Mbarga", results);

    let response = post_json(&app, "/api/v1/report-cards", request.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_subject_is_bad_request() {
    let app = common::create_test_app().await;
    let mut results = common::sequence_results(&[("Mathematics", Some(12.0))]);
    results["subject_breakdown"] = json!([
        common::subject(5, "Mathematics", Some(12.0)),
        common::subject(5, "Mathematics again", Some(13.0))
    ]);
    let request = common::render_request("Ada Mbarga", results);

    let response = post_json(&app, "/api/v1/report-cards", request.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_passing_score_out_of_range_fails_validation() {
    let app = common::create_test_app().await;
    let mut request = common::render_request(
        "Ada Mbarga",
        common::sequence_results(&[("Mathematics", Some(12.0))]),
    );
    request["passing_score"] = json!(25.0);

    let response = post_json(&app, "/api/v1/report-cards", request.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Validation error"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = common::create_test_app().await;

    let response = post_json(&app, "/api/v1/report-cards", "{\"school\": ".to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse JSON request body"));
}

#[tokio::test]
async fn test_batch_keeps_going_past_failures() {
    let app = common::create_test_app().await;
    let request = json!({
        "school": common::school(),
        "locale": "fr",
        "students": [
            {
                "student": common::student("Ada Mbarga"),
                "results": common::term_results()
            },
            {
                "student": common::student("Luc Fotso"),
                "results": null
            },
            {
                "student": common::student("Chantal Ewane"),
                "results": common::year_results("promoted")
            }
        ]
    });

    let response = post_json(&app, "/api/v1/report-cards/batch", request.to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: BatchRenderResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.documents.len(), 2);
    assert_eq!(body.failures.len(), 1);
    assert_eq!(body.failures[0].student, "Luc Fotso");

    let first = &body.documents[0];
    assert_eq!(first.student, "Ada Mbarga");
    assert_eq!(first.filename, "report_card_Ada_Mbarga_Term_1.pdf");
    assert!(first.page_count >= 1);
    let pdf = general_purpose::STANDARD
        .decode(&first.content_base64)
        .unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_batch_over_limit_is_rejected() {
    let mut config = Config::default();
    config.report.max_batch_size = 2;
    let app = common::create_test_app_with(config);

    let students: Vec<Value> = ["A", "B", "C"]
        .iter()
        .map(|name| {
            json!({
                "student": common::student(name),
                "results": common::sequence_results(&[("Mathematics", Some(12.0))])
            })
        })
        .collect();
    let request = json!({"school": common::school(), "students": students});

    let response = post_json(&app, "/api/v1/report-cards/batch", request.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("exceeds the limit"));
}

#[tokio::test]
async fn test_empty_batch_fails_validation() {
    let app = common::create_test_app().await;
    let request = json!({"school": common::school(), "students": []});

    let response = post_json(&app, "/api/v1/report-cards/batch", request.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
