use crate::controller::Controller;
use crate::scheduler::SchedulerEvent;
use crate::ticker::Ticker;
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Cancelled,
}

/// Drive the controller's active run until it finishes or `ticker` is
/// cancelled, reporting every transition to `on_event`.
pub fn play<T, F>(controller: &mut Controller, ticker: &mut T, mut on_event: F) -> PlaybackOutcome
where
    T: Ticker + ?Sized,
    F: FnMut(&SchedulerEvent, &Controller),
{
    while controller.scheduler().state().running {
        if !ticker.wait() {
            tracing::info!("playback cancelled");
            return PlaybackOutcome::Cancelled;
        }
        let events = controller.tick(Utc::now());
        for event in &events {
            on_event(event, controller);
        }
    }
    PlaybackOutcome::Finished
}
