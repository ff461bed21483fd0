use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use teesheet_api::{app, in_memory_state};
use teesheet_booking::BookingSettings;
use teesheet_core::memory::{InMemoryEventSink, InMemoryLockService, InMemoryStore};
use teesheet_core::Course;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    tenant: Uuid,
    course_id: Uuid,
}

async fn setup() -> TestApp {
    let tenant = Uuid::new_v4();
    let course = Course {
        id: Uuid::new_v4(),
        tenant_id: tenant,
        name: "Valley".into(),
        first_tee_time: "07:00".parse().unwrap(),
        last_tee_time: "09:00".parse().unwrap(),
        tee_interval_minutes: 10,
        is_active: true,
    };
    let store = Arc::new(InMemoryStore::new());
    store.add_course(course.clone()).await;

    let state = in_memory_state(
        store,
        Arc::new(InMemoryLockService::new()),
        Arc::new(InMemoryEventSink::new()),
        BookingSettings::default(),
    );
    TestApp { router: app(state), tenant, course_id: course.id }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-tenant-id", self.tenant.to_string())
            .header("x-actor", "front-desk");
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn booking(&self, time: &str, players: u8) -> Value {
        let players: Vec<Value> = (1..=players)
            .map(|p| json!({ "position": p, "player_type": "MEMBER", "member_id": Uuid::new_v4() }))
            .collect();
        json!({
            "course_id": self.course_id,
            "tee_date": "2026-06-02",
            "tee_time": time,
            "players": players,
        })
    }
}

#[tokio::test]
async fn test_tee_sheet_lists_slots() {
    let app = setup().await;
    let uri = format!("/v1/courses/{}/tee-sheet?date=2026-06-02", app.course_id);
    let (status, body) = app.send("GET", &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    let slots = body.as_array().unwrap();
    assert_eq!(slots.len(), 13);
    assert_eq!(slots[0]["time"], "07:00");
    assert_eq!(slots[0]["starting_hole"], 1);
    assert_eq!(slots[0]["available"], true);
}

#[tokio::test]
async fn test_booking_then_capacity_conflict() {
    let app = setup().await;

    let (status, flight) = app.send("POST", "/v1/flights", Some(app.booking("08:00", 2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(flight["booking_number"], "TT-2026-00001");
    assert_eq!(flight["status"], "CONFIRMED");
    assert_eq!(flight["created_by"], "front-desk");

    let (status, body) = app.send("POST", "/v1/flights", Some(app.booking("08:00", 3))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["remaining_capacity"], 2);

    let uri = format!("/v1/courses/{}/tee-sheet?date=2026-06-02", app.course_id);
    let (_, sheet) = app.send("GET", &uri, None).await;
    let slot = sheet
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["time"] == "08:00")
        .unwrap();
    assert_eq!(slot["aggregated_booking"]["total_players"], 2);
    assert_eq!(slot["aggregated_booking"]["remaining_capacity"], 2);
}

#[tokio::test]
async fn test_flight_lifecycle_over_http() {
    let app = setup().await;
    let (_, flight) = app.send("POST", "/v1/flights", Some(app.booking("07:30", 2))).await;
    let id = flight["id"].as_str().unwrap().to_string();

    let (status, checked_in) = app.send("POST", &format!("/v1/flights/{}/check-in", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checked_in["status"], "CHECKED_IN");
    assert_eq!(checked_in["players"][0]["checked_in"], true);

    let (status, _) = app.send("POST", &format!("/v1/flights/{}/check-in", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, events) = app.send("GET", &format!("/v1/flights/{}/events", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 2);
    assert_eq!(events[1]["event"]["event_type"], "CHECKED_IN");
}

#[tokio::test]
async fn test_cancel_twice_is_bad_request() {
    let app = setup().await;
    let (_, flight) = app.send("POST", "/v1/flights", Some(app.booking("07:10", 1))).await;
    let uri = format!("/v1/flights/{}/cancel", flight["id"].as_str().unwrap());

    let (status, cancelled) = app.send("POST", &uri, Some(json!({ "reason": "frost" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["cancellation_reason"], "frost");
    assert_eq!(cancelled["cancelled_by"], "front-desk");

    let (status, _) = app.send("POST", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tenant_scoping() {
    let app = setup().await;

    let request = Request::builder()
        .uri(format!("/v1/courses/{}/tee-sheet?date=2026-06-02", app.course_id))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stranger = TestApp { router: app.router.clone(), tenant: Uuid::new_v4(), course_id: app.course_id };
    let uri = format!("/v1/courses/{}/tee-sheet?date=2026-06-02", app.course_id);
    let (status, _) = stranger.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", &format!("/v1/flights/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_week_view_and_bad_range() {
    let app = setup().await;
    app.send("POST", "/v1/flights", Some(app.booking("07:00", 3))).await;

    let uri = format!("/v1/courses/{}/week-view?start=2026-06-01&days=3", app.course_id);
    let (status, week) = app.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week.as_array().unwrap().len(), 3);
    assert_eq!(week[1]["booked_players"], 3);
    assert_eq!(week[1]["slots"][0]["positions"][3], Value::Null);

    let uri = format!("/v1/courses/{}/week-view?start=2026-06-01&days=0", app.course_id);
    let (status, _) = app.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
