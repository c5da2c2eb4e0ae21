use crate::assignment::{DensityReport, DurationAssignment, OrderingCheck};
use crate::error::{IntersectionError, Result};
use crate::evidence::{Evidence, EvidenceSlots};
use crate::lane::Lane;
use crate::notification::{Notification, Notifier};
use crate::scheduler::{Phase, Scheduler, SchedulerEvent};
use crate::signal::{SignalColor, SignalState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ApiStatus
// ---------------------------------------------------------------------------

/// Outcome of the most recent density-service round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ApiStatus {
    Idle,
    Loading,
    Success,
    Error(String),
}

// ---------------------------------------------------------------------------
// Run handles
// ---------------------------------------------------------------------------

/// Issued by [`Controller::begin_run`]; hand it back to `complete_run`.
#[derive(Debug, Clone)]
pub struct PendingRun {
    pub ticket: Uuid,
    pub evidence: Vec<(Lane, Evidence)>,
}

#[derive(Debug, Clone)]
pub struct RunStarted {
    pub run_id: Uuid,
    pub events: Vec<SchedulerEvent>,
    pub ordering: OrderingCheck,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LaneView {
    pub lane: Lane,
    pub color: SignalColor,
    /// Countdown shown under the light; zero for every lane but the active one.
    pub remaining: u32,
    pub assigned: Option<u32>,
    pub cleared: bool,
    pub has_evidence: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub run_id: Option<Uuid>,
    pub phase: Phase,
    pub active_lane: Option<Lane>,
    pub remaining: u32,
    pub cleared: Vec<Lane>,
    pub running: bool,
    pub signals: SignalState,
    pub lanes: Vec<LaneView>,
    pub missing_evidence: Vec<Lane>,
    pub api_status: ApiStatus,
    pub notification: Option<Notification>,
    pub assignment: Option<DurationAssignment>,
    pub ticks_elapsed: u64,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Everything the presentation shell mutates: evidence, scheduler,
/// notification and service status, kept consistent in one place.
#[derive(Debug, Clone)]
pub struct Controller {
    evidence: EvidenceSlots,
    scheduler: Scheduler,
    notifier: Notifier,
    api_status: ApiStatus,
    pending: Option<Uuid>,
    run_id: Option<Uuid>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Notifier::default())
    }
}

impl Controller {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            evidence: EvidenceSlots::new(),
            scheduler: Scheduler::new(),
            notifier,
            api_status: ApiStatus::Idle,
            pending: None,
            run_id: None,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn evidence(&self) -> &EvidenceSlots {
        &self.evidence
    }

    pub fn api_status(&self) -> &ApiStatus {
        &self.api_status
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn notification(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.notifier.current(now)
    }

    // -----------------------------------------------------------------------
    // Evidence
    // -----------------------------------------------------------------------

    pub fn upload(&mut self, lane: Lane, evidence: Evidence) {
        tracing::debug!(%lane, bytes = evidence.bytes.len(), "evidence uploaded");
        self.evidence.insert(lane, evidence);
    }

    pub fn discard(&mut self, lane: Lane) -> bool {
        self.evidence.remove(lane).is_some()
    }

    // -----------------------------------------------------------------------
    // Run lifecycle
    // -----------------------------------------------------------------------

    /// Check that all lanes have evidence and mark the service call in flight.
    ///
    /// On failure nothing changes.
    pub fn begin_run(&mut self) -> Result<PendingRun> {
        if self.api_status == ApiStatus::Loading {
            return Err(IntersectionError::RunInProgress);
        }
        let evidence = self.evidence.require_complete()?;

        let ticket = Uuid::new_v4();
        self.scheduler.reset();
        self.notifier.clear();
        self.run_id = None;
        self.pending = Some(ticket);
        self.api_status = ApiStatus::Loading;
        tracing::info!(%ticket, "run requested");
        Ok(PendingRun { ticket, evidence })
    }

    /// Adopt the service result for the run identified by `ticket`.
    ///
    /// A failed result leaves the scheduler idle with the error retained in
    /// [`ApiStatus::Error`]. A ticket that no longer matches (the shell reset
    /// or restarted meanwhile) is rejected without touching state.
    pub fn complete_run(
        &mut self,
        ticket: Uuid,
        result: Result<DensityReport>,
        now: DateTime<Utc>,
    ) -> Result<RunStarted> {
        if self.pending != Some(ticket) {
            tracing::debug!(%ticket, "discarding stale density result");
            return Err(IntersectionError::RunCancelled);
        }
        self.pending = None;

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("run aborted: {e}");
                self.api_status = ApiStatus::Error(e.to_string());
                return Err(e);
            }
        };

        let ordering = report.ordering_check();
        if let OrderingCheck::Disagrees { served, derived } = &ordering {
            tracing::warn!(
                ?served,
                ?derived,
                "served lane ordering disagrees with assigned durations"
            );
        }

        let events = self.scheduler.initialize(report.assignment);
        // Zero-second lanes are cleared at initialization; drop their images too.
        let skipped: Vec<Lane> = self.scheduler.state().cleared.iter().copied().collect();
        for lane in skipped {
            self.evidence.remove(lane);
        }
        self.publish(&events, now);

        let run_id = Uuid::new_v4();
        self.run_id = Some(run_id);
        self.api_status = ApiStatus::Success;
        Ok(RunStarted {
            run_id,
            events,
            ordering,
        })
    }

    /// Advance the active run by one second.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<SchedulerEvent> {
        let events = self.scheduler.tick();
        for event in &events {
            if let SchedulerEvent::Cleared { lane } = event {
                self.evidence.remove(*lane);
            }
        }
        self.publish(&events, now);
        events
    }

    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.evidence.clear();
        self.notifier.clear();
        self.api_status = ApiStatus::Idle;
        self.pending = None;
        self.run_id = None;
        tracing::info!("controller reset");
    }

    fn publish(&mut self, events: &[SchedulerEvent], now: DateTime<Utc>) {
        for event in events {
            self.notifier.publish(event, now);
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let state = self.scheduler.state();
        let signals = self.scheduler.signals();
        let assignment = self.scheduler.assignment().copied();

        let lanes = Lane::all()
            .iter()
            .map(|&lane| LaneView {
                lane,
                color: signals.color(lane),
                remaining: if state.active_lane == Some(lane) {
                    state.remaining
                } else {
                    0
                },
                assigned: assignment.map(|a| a.get(lane)),
                cleared: state.cleared.contains(&lane),
                has_evidence: self.evidence.contains(lane),
            })
            .collect();

        Snapshot {
            run_id: self.run_id,
            phase: state.phase(),
            active_lane: state.active_lane,
            remaining: state.remaining,
            cleared: state.cleared.iter().copied().collect(),
            running: state.running,
            signals,
            lanes,
            missing_evidence: self.evidence.missing(),
            api_status: self.api_status.clone(),
            notification: self.notifier.current(now).cloned(),
            assignment,
            ticks_elapsed: self.scheduler.ticks_elapsed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
