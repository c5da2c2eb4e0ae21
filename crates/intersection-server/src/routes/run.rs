use axum::extract::State;
use axum::Json;
use chrono::Utc;
use intersection_core::controller::Snapshot;

use crate::error::AppError;
use crate::state::AppState;
use crate::ticker;

/// POST /api/run: send the four images for analysis and start playback.
pub async fn start_run(State(app): State<AppState>) -> Result<Json<Snapshot>, AppError> {
    let pending = {
        let mut controller = app.controller();
        let pending = controller.begin_run()?;
        app.stop_ticker();
        pending
    };
    app.announce(&[], Utc::now());

    let provider = app.provider.clone();
    let evidence = pending.evidence;
    let result = tokio::task::spawn_blocking(move || provider.analyze(&evidence))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    let now = Utc::now();
    let outcome = app.controller().complete_run(pending.ticket, result, now);
    let started = match outcome {
        Ok(started) => started,
        Err(e) => {
            app.announce(&[], now);
            return Err(e.into());
        }
    };

    app.announce(&started.events, now);
    let running = app.controller().scheduler().state().running;
    if running {
        app.replace_ticker(ticker::spawn(app.clone(), started.run_id));
    }

    Ok(Json(app.controller().snapshot(Utc::now())))
}

/// POST /api/reset: stop playback and discard all run state and images.
pub async fn reset(State(app): State<AppState>) -> Json<Snapshot> {
    let snapshot = {
        let mut controller = app.controller();
        controller.reset();
        app.stop_ticker();
        controller.snapshot(Utc::now())
    };
    app.announce(&[], Utc::now());
    Json(snapshot)
}
