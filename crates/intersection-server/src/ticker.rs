use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use uuid::Uuid;

use crate::state::AppState;

/// Spawn the once-per-period task that advances run `run_id`.
///
/// The task re-checks the controller's run id under the lock before every
/// tick, so once a reset or a newer run has replaced `run_id` it exits
/// without touching state, even if its abort has not landed yet.
pub fn spawn(app: AppState, run_id: Uuid) -> JoinHandle<()> {
    let period = app.tick_interval;
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            let now = Utc::now();
            let (events, running) = {
                let mut controller = app.controller();
                if controller.run_id() != Some(run_id) {
                    tracing::debug!(%run_id, "ticker superseded");
                    return;
                }
                let events = controller.tick(now);
                (events, controller.scheduler().state().running)
            };
            if !events.is_empty() {
                app.announce(&events, now);
            }
            if !running {
                tracing::info!(%run_id, "run finished");
                return;
            }
        }
    })
}
