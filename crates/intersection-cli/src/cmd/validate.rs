use crate::output::print_json;
use crate::render;
use anyhow::{Context, Result};
use intersection_core::assignment::DensityReport;
use serde_json::json;
use std::path::Path;

/// Check a saved density-service response body the way a live run would.
pub fn run(path: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let body: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not JSON", path.display()))?;
    let report = DensityReport::from_response(200, body)?;
    let ordering = report.ordering_check();

    if json {
        print_json(&json!({
            "assignment": report.assignment,
            "activation_order": report.assignment.activation_order(),
            "ordering": ordering,
            "total_secs": report.assignment.total(),
        }))?;
    } else {
        render::print_plan(&report.assignment, &ordering);
        println!("Total green time: {}s", report.assignment.total());
    }
    Ok(())
}
