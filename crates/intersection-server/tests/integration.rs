use axum::http::StatusCode;
use http_body_util::BodyExt;
use intersection_core::assignment::{DensityReport, DurationAssignment};
use intersection_core::config::TimingConfig;
use intersection_core::density::{DensityProvider, FixedDurations};
use intersection_core::evidence::Evidence;
use intersection_core::lane::Lane;
use intersection_core::IntersectionError;
use intersection_server::state::AppState;
use std::sync::Arc;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Provider whose response body is missing the West lane.
struct MissingWest;

impl DensityProvider for MissingWest {
    fn analyze(&self, _evidence: &[(Lane, Evidence)]) -> intersection_core::Result<DensityReport> {
        DensityReport::from_value(serde_json::json!({
            "status": "success",
            "lane_durations": {"North": 5, "East": 8, "South": 2}
        }))
    }
}

struct Unreachable;

impl DensityProvider for Unreachable {
    fn analyze(&self, _evidence: &[(Lane, Evidence)]) -> intersection_core::Result<DensityReport> {
        Err(IntersectionError::ServiceUnavailable("connection refused".into()))
    }
}

fn app_with(provider: Arc<dyn DensityProvider>) -> AppState {
    AppState::new(provider, &TimingConfig::default())
}

fn fixed_app() -> AppState {
    app_with(Arc::new(FixedDurations(DurationAssignment::new(5, 8, 2, 0))))
}

async fn send(app: &AppState, req: axum::http::Request<axum::body::Body>) -> (StatusCode, serde_json::Value) {
    let router = intersection_server::build_router(app.clone());
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

async fn post(app: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

async fn put_image(app: &AppState, lane: &str, bytes: &'static [u8]) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("PUT")
        .uri(format!("/api/lanes/{lane}/evidence"))
        .header("content-type", "image/png")
        .header("x-filename", format!("{lane}.png"))
        .body(axum::body::Body::from(bytes))
        .unwrap();
    send(app, req).await
}

async fn upload_all(app: &AppState) {
    for lane in ["North", "East", "South", "West"] {
        let (status, _) = put_image(app, lane, b"\x89PNG").await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ---------------------------------------------------------------------------
// State & evidence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_state_is_idle_and_all_red() {
    let app = fixed_app();
    let (status, json) = get(&app, "/api/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "idle");
    assert_eq!(json["running"], false);
    assert_eq!(json["active_lane"], serde_json::Value::Null);
    assert_eq!(json["api_status"]["status"], "idle");
    assert_eq!(json["missing_evidence"].as_array().unwrap().len(), 4);
    for lane in ["North", "East", "South", "West"] {
        assert_eq!(json["signals"][lane], "red");
    }
}

#[tokio::test]
async fn upload_and_delete_evidence() {
    let app = fixed_app();
    let (status, json) = put_image(&app, "north", b"img").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lanes"][0]["has_evidence"], true);
    assert_eq!(
        app.controller().evidence().get(Lane::North).unwrap().content_type,
        "image/png"
    );

    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri("/api/lanes/North/evidence")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lanes"][0]["has_evidence"], false);
}

#[tokio::test]
async fn unknown_lane_is_404_and_empty_body_is_400() {
    let app = fixed_app();
    let (status, json) = put_image(&app, "Northeast", b"img").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "invalid_lane");

    let (status, json) = put_image(&app, "East", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "bad_request");
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_with_missing_images_is_refused() {
    let app = fixed_app();
    put_image(&app, "North", b"img").await;
    let (status, json) = post(&app, "/api/run").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "incomplete_input");
    assert!(json["error"].as_str().unwrap().contains("East, South, West"));

    let (_, state) = get(&app, "/api/state").await;
    assert_eq!(state["phase"], "idle");
    assert_eq!(state["api_status"]["status"], "idle");
}

#[tokio::test]
async fn successful_run_activates_highest_lane() {
    let app = fixed_app();
    upload_all(&app).await;

    let (status, json) = post(&app, "/api/run").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "running");
    assert_eq!(json["active_lane"], "East");
    assert_eq!(json["remaining"], 8);
    assert_eq!(json["signals"]["East"], "green");
    assert_eq!(json["signals"]["North"], "red");
    assert_eq!(json["cleared"], serde_json::json!(["West"]));
    assert_eq!(json["api_status"]["status"], "success");
    assert!(app.ticker_active());

    let (status, json) = post(&app, "/api/reset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "idle");
    assert_eq!(json["remaining"], 0);
    assert_eq!(json["cleared"], serde_json::json!([]));
    assert_eq!(json["missing_evidence"].as_array().unwrap().len(), 4);
    assert!(!app.ticker_active());
}

#[tokio::test]
async fn malformed_response_keeps_scheduler_idle() {
    let app = app_with(Arc::new(MissingWest));
    upload_all(&app).await;

    let (status, json) = post(&app, "/api/run").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["kind"], "malformed_assignment");

    let (_, state) = get(&app, "/api/state").await;
    assert_eq!(state["phase"], "idle");
    assert_eq!(state["running"], false);
    assert_eq!(state["api_status"]["status"], "error");
    assert!(state["api_status"]["message"].as_str().unwrap().contains("West"));
    assert!(!app.ticker_active());
}

#[tokio::test]
async fn unreachable_service_is_503_with_message() {
    let app = app_with(Arc::new(Unreachable));
    upload_all(&app).await;

    let (status, json) = post(&app, "/api/run").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().contains("connection refused"));

    // Images survive a failed attempt so the user can retry.
    let (_, state) = get(&app, "/api/state").await;
    assert_eq!(state["missing_evidence"], serde_json::json!([]));
}

#[tokio::test]
async fn all_zero_run_finishes_without_ticker() {
    let app = app_with(Arc::new(FixedDurations(DurationAssignment::new(0, 0, 0, 0))));
    upload_all(&app).await;

    let (status, json) = post(&app, "/api/run").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "finished");
    assert_eq!(json["notification"]["message"], "All lanes have been processed!");
    assert!(!app.ticker_active());
}

#[tokio::test(start_paused = true)]
async fn reset_stops_playback_for_good() {
    let app = fixed_app();
    upload_all(&app).await;
    let (status, _) = post(&app, "/api/run").await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.ticker_active());

    let (status, json) = post(&app, "/api/reset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "idle");
    assert!(!app.ticker_active());

    tokio::time::advance(std::time::Duration::from_secs(20)).await;
    tokio::task::yield_now().await;

    let (_, state) = get(&app, "/api/state").await;
    assert_eq!(state["phase"], "idle");
    assert_eq!(state["ticks_elapsed"], 0);
    assert_eq!(state["active_lane"], serde_json::Value::Null);
    assert_eq!(state["run_id"], serde_json::Value::Null);
}
