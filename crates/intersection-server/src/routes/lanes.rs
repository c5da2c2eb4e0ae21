use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::Utc;
use intersection_core::controller::Snapshot;
use intersection_core::evidence::Evidence;
use intersection_core::lane::Lane;

use crate::error::AppError;
use crate::state::AppState;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// PUT /api/lanes/{lane}/evidence: store the request body as the lane's image.
pub async fn put_evidence(
    State(app): State<AppState>,
    Path(lane): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Snapshot>, AppError> {
    let lane: Lane = lane.parse()?;
    if body.is_empty() {
        return Err(AppError::bad_request(format!("empty image for {lane} lane")));
    }
    let filename = header_str(&headers, "x-filename")
        .map(str::to_string)
        .unwrap_or_else(|| lane.upload_filename());
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str())
        .unwrap_or("image/jpeg")
        .to_string();

    let snapshot = {
        let mut controller = app.controller();
        controller.upload(lane, Evidence::new(filename, content_type, body.to_vec()));
        controller.snapshot(Utc::now())
    };
    app.announce(&[], Utc::now());
    Ok(Json(snapshot))
}

/// DELETE /api/lanes/{lane}/evidence: drop the lane's image.
pub async fn delete_evidence(
    State(app): State<AppState>,
    Path(lane): Path<String>,
) -> Result<Json<Snapshot>, AppError> {
    let lane: Lane = lane.parse()?;
    let snapshot = {
        let mut controller = app.controller();
        controller.discard(lane);
        controller.snapshot(Utc::now())
    };
    app.announce(&[], Utc::now());
    Ok(Json(snapshot))
}
