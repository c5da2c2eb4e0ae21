use crate::assignment::DurationAssignment;
use crate::lane::Lane;
use crate::signal::SignalState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Finished => "finished",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// SchedulerState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    pub active_lane: Option<Lane>,
    /// Countdown of the active lane only.
    pub remaining: u32,
    pub cleared: BTreeSet<Lane>,
    pub running: bool,
}

impl SchedulerState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.running {
            Phase::Running
        } else if self.cleared.len() == Lane::COUNT {
            Phase::Finished
        } else {
            Phase::Idle
        }
    }
}

// ---------------------------------------------------------------------------
// SchedulerEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    Activated { lane: Lane, duration: u32 },
    Cleared { lane: Lane },
    Finished,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Plays back one [`DurationAssignment`], serving one lane at a time.
///
/// Lanes are activated by descending assigned duration (ties go to the lane
/// with higher priority, see [`Lane`]). Lanes assigned zero seconds are
/// counted as cleared at initialization and never turn green.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    state: SchedulerState,
    assignment: Option<DurationAssignment>,
    ticks_elapsed: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn assignment(&self) -> Option<&DurationAssignment> {
        self.assignment.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn signals(&self) -> SignalState {
        SignalState::project(self.state.active_lane)
    }

    /// Ticks consumed since the last `initialize`.
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    /// Start a run, discarding whatever run was in progress.
    pub fn initialize(&mut self, assignment: DurationAssignment) -> Vec<SchedulerEvent> {
        self.state = SchedulerState::idle();
        self.ticks_elapsed = 0;
        self.state.cleared = assignment
            .iter()
            .filter(|(_, secs)| *secs == 0)
            .map(|(lane, _)| lane)
            .collect();
        self.assignment = Some(assignment);
        self.state.running = true;

        tracing::info!(
            total_secs = assignment.total(),
            skipped = self.state.cleared.len(),
            "scheduler initialized"
        );
        self.advance(None)
    }

    /// Advance the countdown by one second.
    ///
    /// No-op when the scheduler is not running.
    pub fn tick(&mut self) -> Vec<SchedulerEvent> {
        if !self.state.running {
            tracing::debug!(phase = %self.phase(), "tick ignored");
            return Vec::new();
        }
        let Some(lane) = self.state.active_lane else {
            return Vec::new();
        };

        self.ticks_elapsed += 1;
        self.state.remaining = self.state.remaining.saturating_sub(1);
        tracing::debug!(%lane, remaining = self.state.remaining, "tick");
        if self.state.remaining > 0 {
            return Vec::new();
        }

        self.state.cleared.insert(lane);
        let mut events = vec![SchedulerEvent::Cleared { lane }];
        events.extend(self.advance(Some(lane)));
        events
    }

    pub fn reset(&mut self) {
        self.state = SchedulerState::idle();
        self.assignment = None;
        self.ticks_elapsed = 0;
    }

    /// Pick the next lane from the original assignment, or finish the run.
    fn advance(&mut self, previous: Option<Lane>) -> Vec<SchedulerEvent> {
        let Some(assignment) = self.assignment else {
            return Vec::new();
        };
        let next = assignment.ranking().into_iter().find(|&l| {
            Some(l) != previous && !self.state.cleared.contains(&l) && assignment.get(l) > 0
        });

        match next {
            Some(lane) => {
                let duration = assignment.get(lane);
                self.state.active_lane = Some(lane);
                self.state.remaining = duration;
                tracing::info!(%lane, duration, "lane activated");
                vec![SchedulerEvent::Activated { lane, duration }]
            }
            None => {
                self.state.active_lane = None;
                self.state.remaining = 0;
                self.state.running = false;
                tracing::info!(ticks = self.ticks_elapsed, "all lanes processed");
                vec![SchedulerEvent::Finished]
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalColor;

    fn tick_n(s: &mut Scheduler, n: u32) -> Vec<SchedulerEvent> {
        (0..n).flat_map(|_| s.tick()).collect()
    }

    #[test]
    fn serves_highest_first_then_by_assigned_duration() {
        let mut s = Scheduler::new();
        let events = s.initialize(DurationAssignment::new(5, 8, 2, 0));
        assert_eq!(
            events,
            vec![SchedulerEvent::Activated { lane: Lane::East, duration: 8 }]
        );
        assert_eq!(s.signals().green_lane(), Some(Lane::East));
        assert_eq!(s.state().cleared, BTreeSet::from([Lane::West]));

        assert!(tick_n(&mut s, 7).is_empty());
        assert_eq!(s.state().remaining, 1);
        assert_eq!(
            s.tick(),
            vec![
                SchedulerEvent::Cleared { lane: Lane::East },
                SchedulerEvent::Activated { lane: Lane::North, duration: 5 },
            ]
        );
        assert_eq!(s.signals().color(Lane::East), SignalColor::Red);

        let events = tick_n(&mut s, 5);
        assert_eq!(
            events,
            vec![
                SchedulerEvent::Cleared { lane: Lane::North },
                SchedulerEvent::Activated { lane: Lane::South, duration: 2 },
            ]
        );

        let events = tick_n(&mut s, 2);
        assert_eq!(
            events,
            vec![SchedulerEvent::Cleared { lane: Lane::South }, SchedulerEvent::Finished]
        );
        assert!(!s.state().running);
        assert_eq!(s.state().active_lane, None);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.ticks_elapsed(), 15);
        assert_eq!(s.signals(), SignalState::all_red());
    }

    #[test]
    fn ties_resolve_to_lane_priority_every_run() {
        for _ in 0..3 {
            let mut s = Scheduler::new();
            s.initialize(DurationAssignment::new(5, 5, 1, 1));
            assert_eq!(s.state().active_lane, Some(Lane::North));
            let events = tick_n(&mut s, 5);
            assert_eq!(events[1], SchedulerEvent::Activated { lane: Lane::East, duration: 5 });
            let events = tick_n(&mut s, 5);
            assert_eq!(events[1], SchedulerEvent::Activated { lane: Lane::South, duration: 1 });
            let events = s.tick();
            assert_eq!(events[1], SchedulerEvent::Activated { lane: Lane::West, duration: 1 });
        }
    }

    #[test]
    fn all_zero_assignment_finishes_immediately() {
        let mut s = Scheduler::new();
        let events = s.initialize(DurationAssignment::new(0, 0, 0, 0));
        assert_eq!(events, vec![SchedulerEvent::Finished]);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.state().cleared.len(), 4);
        assert!(s.tick().is_empty());
    }

    #[test]
    fn tick_while_idle_is_noop() {
        let mut s = Scheduler::new();
        assert!(s.tick().is_empty());
        assert_eq!(s.state(), &SchedulerState::idle());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn reset_returns_exactly_to_idle() {
        let mut s = Scheduler::new();
        s.initialize(DurationAssignment::new(3, 1, 0, 2));
        tick_n(&mut s, 2);
        s.reset();
        assert_eq!(s.state(), &SchedulerState::idle());
        assert_eq!(s.state().remaining, 0);
        assert!(s.assignment().is_none());
        assert_eq!(s.ticks_elapsed(), 0);

        // Reset after finishing as well.
        s.initialize(DurationAssignment::new(1, 0, 0, 0));
        s.tick();
        assert_eq!(s.phase(), Phase::Finished);
        s.reset();
        assert_eq!(s.state(), &SchedulerState::idle());
    }

    #[test]
    fn reinitialize_discards_previous_run() {
        let mut s = Scheduler::new();
        s.initialize(DurationAssignment::new(2, 0, 0, 0));
        s.tick();
        s.initialize(DurationAssignment::new(0, 0, 0, 4));
        assert_eq!(s.state().active_lane, Some(Lane::West));
        assert_eq!(s.state().remaining, 4);
        assert_eq!(s.ticks_elapsed(), 0);
    }

    #[test]
    fn invariants_hold_for_every_small_assignment() {
        for code in 0..256u32 {
            let d = |shift: u32| (code >> shift) & 0b11;
            let assignment = DurationAssignment::new(d(0), d(2), d(4), d(6));
            let mut s = Scheduler::new();
            let mut activated = Vec::new();
            let mut cleared_events = Vec::new();

            let mut record = |events: Vec<SchedulerEvent>| {
                for e in events {
                    match e {
                        SchedulerEvent::Activated { lane, .. } => activated.push(lane),
                        SchedulerEvent::Cleared { lane } => cleared_events.push(lane),
                        SchedulerEvent::Finished => {}
                    }
                }
            };

            record(s.initialize(assignment));
            let mut guard = 0;
            while s.state().running {
                let st = s.state();
                assert!(st.active_lane.is_some());
                assert!(st.remaining > 0);
                assert_eq!(s.signals().iter().filter(|(_, c)| *c == SignalColor::Green).count(), 1);
                // Cleared, active and pending lanes partition the lane set.
                let active = st.active_lane.unwrap();
                assert!(!st.cleared.contains(&active));

                record(s.tick());
                guard += 1;
                assert!(guard <= 12, "run did not terminate for {assignment:?}");
            }

            assert_eq!(s.signals(), SignalState::all_red());
            assert_eq!(s.state().cleared.len(), Lane::COUNT);
            assert_eq!(activated, assignment.activation_order());
            assert_eq!(cleared_events, activated);
            let expected_ticks: u64 = activated.iter().map(|&l| u64::from(assignment.get(l))).sum();
            assert_eq!(s.ticks_elapsed(), expected_ticks);
            assert_eq!(s.ticks_elapsed(), assignment.total());
        }
    }
}
