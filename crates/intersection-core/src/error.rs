use crate::lane::Lane;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntersectionError {
    #[error("missing evidence for lanes: {}", join_lanes(.missing))]
    IncompleteInput { missing: Vec<Lane> },

    #[error("density service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("density service error (status {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("malformed duration assignment: {0}")]
    MalformedAssignment(String),

    #[error("a run is already in progress")]
    RunInProgress,

    #[error("run was reset before the density analysis completed")]
    RunCancelled,

    #[error("invalid lane '{0}': expected North, East, South or West")]
    InvalidLane(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl IntersectionError {
    /// Stable snake_case tag used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            IntersectionError::IncompleteInput { .. } => "incomplete_input",
            IntersectionError::ServiceUnavailable(_) => "service_unavailable",
            IntersectionError::ServiceError { .. } => "service_error",
            IntersectionError::MalformedAssignment(_) => "malformed_assignment",
            IntersectionError::RunInProgress => "run_in_progress",
            IntersectionError::RunCancelled => "run_cancelled",
            IntersectionError::InvalidLane(_) => "invalid_lane",
            IntersectionError::InvalidConfig(_) => "invalid_config",
            IntersectionError::Io(_) => "io",
            IntersectionError::Yaml(_) => "yaml",
            IntersectionError::Json(_) => "json",
        }
    }
}

fn join_lanes(lanes: &[Lane]) -> String {
    lanes
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, IntersectionError>;
