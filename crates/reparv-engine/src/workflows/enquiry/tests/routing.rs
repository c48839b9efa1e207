use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::enquiry::router::enquiry_router;

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("request")
}

#[tokio::test]
async fn post_enquiries_returns_created_view() {
    let (service, _, _) = build_service();
    let router = enquiry_router(service);

    let body = serde_json::to_value(sales_lead()).expect("serialize lead");
    let response = router
        .oneshot(json_post("/api/v1/enquiries", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert!(payload.get("enquiry_id").is_some());
    assert_eq!(payload.get("status"), Some(&json!("new")));
    assert_eq!(
        payload
            .get("reference_code")
            .and_then(serde_json::Value::as_str)
            .map(str::len),
        Some(8)
    );
}

#[tokio::test]
async fn get_enquiry_returns_status_snapshot() {
    let (service, _, _) = build_service();
    let record = service.create(sales_lead()).expect("create");
    let router = enquiry_router(service);

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/enquiries/{}",
                record.enquiry.enquiry_id.0
            ))
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.get("enquiry_id").and_then(serde_json::Value::as_str),
        Some(record.enquiry.enquiry_id.0.as_str())
    );
    assert_eq!(payload.get("booked"), Some(&json!(false)));
    assert_eq!(payload.get("broker_tier"), Some(&json!("sales")));
}

#[tokio::test]
async fn unknown_enquiry_returns_not_found() {
    let (service, _, _) = build_service();
    let router = enquiry_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/enquiries/enq-does-not-exist")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_with_blank_remark_is_unprocessable() {
    let (service, _, _) = build_service();
    let record = service.create(sales_lead()).expect("create");
    let router = enquiry_router(service);

    let response = router
        .oneshot(json_post(
            &format!("/api/v1/enquiries/{}/cancel", record.enquiry.enquiry_id.0),
            json!({ "remark": "  " }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn token_route_books_once_then_conflicts() {
    let (service, _, _) = build_service();
    let record = service.create(sales_lead()).expect("create");
    let router = enquiry_router(service);
    let uri = format!("/api/v1/enquiries/{}/token", record.enquiry.enquiry_id.0);
    let body = serde_json::to_value(booking_request()).expect("serialize booking");

    let first = router
        .clone()
        .oneshot(json_post(&uri, body.clone()))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::CREATED);
    let payload = read_json_body(first).await;
    let breakdown = payload
        .get("token")
        .and_then(|token| token.get("breakdown"))
        .expect("breakdown present");
    assert_eq!(breakdown.get("total_commission"), Some(&json!("20000")));
    assert_eq!(breakdown.get("tds"), Some(&json!("240")));

    let second = router
        .oneshot(json_post(&uri, body))
        .await
        .expect("route executes");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn broker_route_conflicts_after_booking() {
    let (service, _, _) = build_service();
    let record = service.create(sales_lead()).expect("create");
    service
        .book(&record.enquiry.enquiry_id, booking_request())
        .expect("booking");
    let router = enquiry_router(service);

    let response = router
        .oneshot(json_post(
            &format!("/api/v1/enquiries/{}/broker", record.enquiry.enquiry_id.0),
            json!({ "tier": "territory", "partner_id": "TP-200" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn timeline_route_lists_events_oldest_first() {
    let (service, _, _) = build_service();
    let record = service.create(sales_lead()).expect("create");
    service
        .add_follow_up(
            &record.enquiry.enquiry_id,
            crate::workflows::enquiry::service::FollowUpRequest {
                remark: "spoke on phone".to_string(),
                visit_date: Some("2026-09-12".to_string()),
                status_label: None,
            },
        )
        .expect("follow up");
    let router = enquiry_router(service);

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/enquiries/{}/timeline",
                record.enquiry.enquiry_id.0
            ))
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let events = payload.as_array().expect("timeline array");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].get("kind"), Some(&json!("follow_up")));
    assert_eq!(events[0].get("visit_date"), Some(&json!("2026-09-12")));
}
