use chrono::{DateTime, Utc};
use intersection_core::config::TimingConfig;
use intersection_core::controller::Controller;
use intersection_core::density::DensityProvider;
use intersection_core::notification::Notification;
use intersection_core::scheduler::SchedulerEvent;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Message fanned out to `/api/events` subscribers.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Update,
    Notification(Notification),
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Mutex<Controller>>,
    pub provider: Arc<dyn DensityProvider>,
    pub event_tx: broadcast::Sender<ServerEvent>,
    pub tick_interval: Duration,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn DensityProvider>, timing: &TimingConfig) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            controller: Arc::new(Mutex::new(Controller::new(timing.notifier()))),
            provider,
            event_tx: tx,
            tick_interval: timing.tick_interval(),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    /// Lock the controller, recovering the guard if a previous holder panicked.
    pub fn controller(&self) -> MutexGuard<'_, Controller> {
        self.controller.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install the ticker task for a new run, aborting any previous one.
    pub fn replace_ticker(&self, handle: JoinHandle<()>) {
        let mut slot = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    pub fn stop_ticker(&self) {
        let mut slot = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.take() {
            old.abort();
        }
    }

    pub fn ticker_active(&self) -> bool {
        let slot = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Broadcast the notifications produced by `events`, then a state update.
    pub fn announce(&self, events: &[SchedulerEvent], now: DateTime<Utc>) {
        for event in events {
            if let Some(n) = Notification::for_event(event, now) {
                let _ = self.event_tx.send(ServerEvent::Notification(n));
            }
        }
        let _ = self.event_tx.send(ServerEvent::Update);
    }
}
