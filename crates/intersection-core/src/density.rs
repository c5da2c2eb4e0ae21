use crate::assignment::{DensityReport, DurationAssignment};
use crate::error::{IntersectionError, Result};
use crate::evidence::Evidence;
use crate::lane::Lane;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::ACCEPT;
use std::time::Duration;

/// Source of a [`DensityReport`] for one set of lane images.
pub trait DensityProvider: Send + Sync {
    fn analyze(&self, evidence: &[(Lane, Evidence)]) -> Result<DensityReport>;
}

// ---------------------------------------------------------------------------
// HttpDensityService
// ---------------------------------------------------------------------------

/// Client for the remote density-analysis service.
///
/// Uses the blocking reqwest client: construct it outside of an async
/// context and call it from `spawn_blocking` when inside one.
pub struct HttpDensityService {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpDensityService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IntersectionError::ServiceUnavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.base_url.trim_end_matches('/'))
    }
}

impl DensityProvider for HttpDensityService {
    fn analyze(&self, evidence: &[(Lane, Evidence)]) -> Result<DensityReport> {
        let mut form = Form::new();
        for (lane, ev) in evidence {
            let part = Part::bytes(ev.bytes.clone())
                .file_name(lane.upload_filename())
                .mime_str(&ev.content_type)
                .map_err(|e| {
                    IntersectionError::ServiceUnavailable(format!(
                        "invalid content type '{}' for {lane}: {e}",
                        ev.content_type
                    ))
                })?;
            form = form.part("images", part);
        }

        let url = self.upload_url();
        tracing::info!(%url, lanes = evidence.len(), "requesting density analysis");
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .map_err(|e| IntersectionError::ServiceUnavailable(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| IntersectionError::ServiceUnavailable(e.to_string()))?;
        let result = interpret(status, &text);
        if let Err(e) = &result {
            tracing::warn!(status, "density analysis failed: {e}");
        }
        result
    }
}

/// Turn a raw HTTP status and body into a report or a classified error.
fn interpret(status: u16, text: &str) -> Result<DensityReport> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(body) => DensityReport::from_response(status, body),
        Err(_) if !(200..300).contains(&status) => Err(IntersectionError::ServiceError {
            status,
            message: text.trim().to_string(),
        }),
        Err(e) => Err(IntersectionError::MalformedAssignment(format!(
            "response body is not JSON: {e}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// FixedDurations
// ---------------------------------------------------------------------------

/// Provider that ignores the images and returns a preset assignment.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurations(pub DurationAssignment);

impl DensityProvider for FixedDurations {
    fn analyze(&self, _evidence: &[(Lane, Evidence)]) -> Result<DensityReport> {
        Ok(DensityReport::from_assignment(self.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
