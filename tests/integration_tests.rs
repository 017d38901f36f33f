use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower::ServiceExt;

use calendry::config::AppConfig;
use calendry::db;
use calendry::handlers;
use calendry::services::auth::ConfigAuthProvider;
use calendry::services::messaging::MessagingProvider;
use calendry::state::AppState;

// ── Mock Providers ──

struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl MockMessaging {
    fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: false,
        }
    }
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("provider down")
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_email: "admin@salon.ma".to_string(),
        admin_password: "secret".to_string(),
        superadmin_email: "owner@salon.ma".to_string(),
        superadmin_password: "supersecret".to_string(),
        api_token: "test-token".to_string(),
        twilio_account_sid: String::new(),
        twilio_auth_token: String::new(),
        twilio_whatsapp_number: "whatsapp:+14155238886".to_string(),
        country_code: "212".to_string(),
        national_number_len: 9,
        open_hour: 9,
        close_hour: 20,
        slot_step_minutes: 30,
        reminder_anchor: "rolling".to_string(),
        reminder_lead_min_minutes: 105,
        reminder_lead_max_minutes: 125,
        reminder_run_hour: 9,
        reminder_tick_minutes: 5,
        utc_offset_minutes: 60,
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let messaging = MockMessaging::new();
    let sent = Arc::clone(&messaging.sent);
    let auth = ConfigAuthProvider::from_config(&config);
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        messaging: Arc::new(messaging),
        auth: Arc::new(auth),
    });
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route(
            "/api/bookings/:id",
            patch(handlers::bookings::update_booking).delete(handlers::bookings::delete_booking),
        )
        .route("/api/bookings/:id/move", post(handlers::bookings::move_booking))
        .route(
            "/api/staff",
            get(handlers::staff::list_staff).post(handlers::staff::create_staff),
        )
        .route("/api/staff/:id", delete(handlers::staff::delete_staff))
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/api/clients/:id",
            put(handlers::clients::update_client).delete(handlers::clients::delete_client),
        )
        .route("/api/availability", get(handlers::planning::get_availability))
        .route("/api/planning/day", get(handlers::planning::get_planning_day))
        .with_state(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn booking_payload(name: &str, date: &str, time: &str, staff: Option<&str>, duration: i32) -> serde_json::Value {
    serde_json::json!({
        "client_name": name,
        "client_phone": "0612345678",
        "date": date,
        "time": time,
        "duration_minutes": duration,
        "service_name": "Coupe",
        "staff_id": staff,
    })
}

async fn create_booking(app: &Router, payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/bookings", payload, None))
        .await
        .unwrap();
    let status = res.status();
    (status, body_json(res).await)
}

async fn create_staff(app: &Router, name: &str) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/staff",
            serde_json::json!({ "name": name, "color": "#EC4899" }),
            Some("test-token"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

// ── Health & auth ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();
    let app = test_app(state);
    let res = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let (state, _) = test_state();
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "admin@salon.ma", "password": "secret" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["token"], "test-token");

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "admin@salon.ma", "password": "wrong" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_auth() {
    let (state, _) = test_state();
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/staff",
            serde_json::json!({ "name": "Leila" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(get_request("/api/clients", Some("wrong-token")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// ── Bookings ──

#[tokio::test]
async fn test_create_booking_sends_confirmation() {
    let (state, sent) = test_state();
    let app = test_app(state);

    let (status, body) = create_booking(
        &app,
        booking_payload("Amina", "2025-06-16", "10:00", None, 45),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_str().is_some());
    assert_eq!(body["end_time"], "10:45");

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "whatsapp:+212612345678");
    assert!(sent[0].1.contains("16/06/2025"));
    assert!(sent[0].1.contains("10:00"));
}

#[tokio::test]
async fn test_create_booking_rejects_bad_phone() {
    let (state, sent) = test_state();
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            serde_json::json!({
                "client_name": "Amina",
                "client_phone": "12345",
                "date": "2025-06-16",
                "time": "10:00",
            }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(sent.lock().unwrap().is_empty());

    let res = app.oneshot(get_request("/api/bookings", None)).await.unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_booking_defaults_duration_from_service() {
    let (state, _) = test_state();
    let app = test_app(state);

    let (status, body) = create_booking(
        &app,
        serde_json::json!({
            "client_name": "Sara",
            "client_phone": "0612345678",
            "date": "2025-06-16",
            "time": "14:00",
            "service_name": "Coloration",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["duration_minutes"], 120);
}

#[tokio::test]
async fn test_double_booking_same_staff_rejected() {
    let (state, _) = test_state();
    let app = test_app(state);
    let staff_id = create_staff(&app, "Leila").await;

    let (status, _) = create_booking(
        &app,
        booking_payload("Amina", "2025-06-16", "10:00", Some(&staff_id), 60),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Overlapping interval on the same staff member is refused.
    let (status, body) = create_booking(
        &app,
        booking_payload("Sara", "2025-06-16", "10:30", Some(&staff_id), 60),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already booked"));

    // Touching interval is fine: [10:00,11:00) then [11:00,12:00).
    let (status, _) = create_booking(
        &app,
        booking_payload("Sara", "2025-06-16", "11:00", Some(&staff_id), 60),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_patch_booking_allow_listed_fields() {
    let (state, _) = test_state();
    let app = test_app(state);

    let (_, created) = create_booking(
        &app,
        booking_payload("Amina", "2025-06-16", "10:00", None, 45),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    // Unknown fields are ignored, known ones applied.
    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            serde_json::json!({
                "time": "11:30",
                "notes": "prefers window seat",
                "reminder_sent": true,
                "id": "spoofed",
            }),
            Some("test-token"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["time"], "11:30");
    assert_eq!(body["notes"], "prefers window seat");
    assert_eq!(body["id"], id);
    // reminder_sent is not client-writable
    assert_eq!(body["reminder_sent"], false);
}

#[tokio::test]
async fn test_patch_into_conflict_rejected() {
    let (state, _) = test_state();
    let app = test_app(state);
    let staff_id = create_staff(&app, "Leila").await;

    create_booking(
        &app,
        booking_payload("Amina", "2025-06-16", "10:00", Some(&staff_id), 60),
    )
    .await;
    let (_, second) = create_booking(
        &app,
        booking_payload("Sara", "2025-06-16", "12:00", Some(&staff_id), 60),
    )
    .await;
    let id = second["id"].as_str().unwrap();

    let res = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            serde_json::json!({ "time": "10:30" }),
            Some("test-token"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_move_booking_snaps_to_grid() {
    let (state, _) = test_state();
    let app = test_app(state);
    let staff_id = create_staff(&app, "Leila").await;

    let (_, created) = create_booking(
        &app,
        booking_payload("Amina", "2025-06-16", "10:00", None, 45),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/move"),
            serde_json::json!({ "date": "2025-06-17", "time": "14:07", "staff_id": staff_id }),
            Some("test-token"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["date"], "2025-06-17");
    assert_eq!(body["time"], "14:00");
    assert_eq!(body["staff_id"], staff_id.as_str());
    // Duration preserved across the move.
    assert_eq!(body["duration_minutes"], 45);
    assert_eq!(body["end_time"], "14:45");
}

#[tokio::test]
async fn test_delete_booking() {
    let (state, _) = test_state();
    let app = test_app(state);

    let (_, created) = create_booking(
        &app,
        booking_payload("Amina", "2025-06-16", "10:00", None, 45),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/bookings/{id}"))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/bookings/{id}"))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Availability ──

#[tokio::test]
async fn test_availability_slot_fills_at_capacity() {
    let (state, _) = test_state();
    let app = test_app(state);
    create_staff(&app, "Leila").await;
    create_staff(&app, "Nadia").await;

    create_booking(&app, booking_payload("A", "2025-06-16", "10:00", None, 30)).await;

    let res = app
        .clone()
        .oneshot(get_request("/api/availability?date=2025-06-16", None))
        .await
        .unwrap();
    let body = body_json(res).await;
    let slot = |t: &str| {
        body["slots"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["time"] == t)
            .unwrap()["full"]
            .as_bool()
            .unwrap()
    };
    // One booking against two staff: still bookable.
    assert!(!slot("10:00"));

    create_booking(&app, booking_payload("B", "2025-06-16", "10:00", None, 30)).await;

    let res = app
        .oneshot(get_request("/api/availability?date=2025-06-16", None))
        .await
        .unwrap();
    let body = body_json(res).await;
    let full: Vec<&str> = body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["full"].as_bool().unwrap())
        .map(|s| s["time"].as_str().unwrap())
        .collect();
    assert_eq!(full, vec!["10:00"]);
}

#[tokio::test]
async fn test_availability_fails_open_without_staff() {
    let (state, _) = test_state();
    let app = test_app(state);

    create_booking(&app, booking_payload("A", "2025-06-16", "10:00", None, 30)).await;
    create_booking(&app, booking_payload("B", "2025-06-16", "10:00", None, 30)).await;

    let res = app
        .oneshot(get_request("/api/availability?date=2025-06-16", None))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert!(body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| !s["full"].as_bool().unwrap()));
}

// ── Planning / layout ──

#[tokio::test]
async fn test_planning_day_layout_columns() {
    let (state, _) = test_state();
    let app = test_app(state);
    let staff_id = create_staff(&app, "Leila").await;

    // 9:00-10:00 and 9:30-10:30 overlap; 10:15-10:45 chains onto the second.
    // The middle one is unassigned so the per-staff conflict check stays out
    // of the way.
    create_booking(&app, booking_payload("A", "2025-06-16", "09:00", Some(&staff_id), 60)).await;
    create_booking(&app, booking_payload("B", "2025-06-16", "09:30", None, 60)).await;
    create_booking(&app, booking_payload("C", "2025-06-16", "10:15", Some(&staff_id), 30)).await;

    let res = app
        .oneshot(get_request("/api/planning/day?date=2025-06-16", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;

    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    let by_title = |t: &str| {
        events
            .iter()
            .find(|e| e["title"] == t)
            .unwrap()
    };
    let (a, b, c) = (by_title("A"), by_title("B"), by_title("C"));
    // Chained overlap renders as two consistent lanes.
    for e in [a, b, c] {
        assert_eq!(e["total_columns"], 2);
    }
    assert_ne!(a["column_index"], b["column_index"]);
    assert_ne!(b["column_index"], c["column_index"]);

    assert_eq!(body["hour_labels"].as_array().unwrap().len(), 24);
    assert_eq!(a["staff_name"], "Leila");
}

#[tokio::test]
async fn test_planning_day_tolerates_orphaned_staff() {
    let (state, _) = test_state();
    let app = test_app(state);
    let staff_id = create_staff(&app, "Leila").await;

    create_booking(&app, booking_payload("A", "2025-06-16", "09:00", Some(&staff_id), 60)).await;

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/staff/{staff_id}"))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_request("/api/planning/day?date=2025-06-16", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let event = &body["events"].as_array().unwrap()[0];
    // The dangling reference renders as an unresolved resource, not an error.
    assert_eq!(event["staff_id"], staff_id.as_str());
    assert!(event["staff_name"].is_null());
}

#[tokio::test]
async fn test_planning_day_excludes_cancelled() {
    let (state, _) = test_state();
    let app = test_app(state);

    let (_, created) = create_booking(
        &app,
        booking_payload("A", "2025-06-16", "09:00", None, 60),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    create_booking(&app, booking_payload("B", "2025-06-16", "09:30", None, 60)).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            serde_json::json!({ "status": "cancelled" }),
            Some("test-token"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_request("/api/planning/day?date=2025-06-16", None))
        .await
        .unwrap();
    let body = body_json(res).await;
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "B");
    // Alone on the timeline again: full width.
    assert_eq!(events[0]["total_columns"], 1);
}

// ── Clients ──

#[tokio::test]
async fn test_client_crud_round_trip() {
    let (state, _) = test_state();
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/clients",
            serde_json::json!({ "first_name": "Sara", "last_name": "B", "phone": "0612345678" }),
            Some("test-token"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/clients/{id}"),
            serde_json::json!({ "first_name": "Sara", "last_name": "B", "phone": "0698765432" }),
            Some("test-token"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(get_request("/api/clients", Some("test-token")))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["phone"], "0698765432");

    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/clients/{id}"))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
