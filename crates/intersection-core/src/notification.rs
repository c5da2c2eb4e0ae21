use crate::lane::Lane;
use crate::scheduler::SchedulerEvent;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const DEFAULT_VISIBILITY_SECS: i64 = 3;

pub const ALL_PROCESSED: &str = "All lanes have been processed!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub lane: Option<Lane>,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    /// Message for a scheduler event, if that event is announced at all.
    pub fn for_event(event: &SchedulerEvent, now: DateTime<Utc>) -> Option<Self> {
        match event {
            SchedulerEvent::Cleared { lane } => Some(Self {
                lane: Some(*lane),
                message: format!("{lane} lane signal cleared!"),
                emitted_at: now,
            }),
            SchedulerEvent::Finished => Some(Self {
                lane: None,
                message: ALL_PROCESSED.to_string(),
                emitted_at: now,
            }),
            SchedulerEvent::Activated { .. } => None,
        }
    }
}

/// Holds the single notification currently on screen.
///
/// A new notification replaces the old one immediately; an unreplaced one
/// disappears once `visibility` has elapsed since it was emitted.
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Notification>,
    visibility: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_VISIBILITY_SECS))
    }
}

impl Notifier {
    pub fn new(visibility: Duration) -> Self {
        Self {
            current: None,
            visibility,
        }
    }

    /// Record the notification for `event`. Returns it when one was produced.
    pub fn publish(&mut self, event: &SchedulerEvent, now: DateTime<Utc>) -> Option<&Notification> {
        let notification = Notification::for_event(event, now)?;
        self.current = Some(notification);
        self.current.as_ref()
    }

    pub fn current(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|n| now - n.emitted_at < self.visibility)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn cleared_and_finished_messages() {
        let n = Notification::for_event(&SchedulerEvent::Cleared { lane: Lane::East }, t0()).unwrap();
        assert_eq!(n.message, "East lane signal cleared!");
        assert_eq!(n.lane, Some(Lane::East));

        let n = Notification::for_event(&SchedulerEvent::Finished, t0()).unwrap();
        assert_eq!(n.message, "All lanes have been processed!");
        assert_eq!(n.lane, None);

        let activated = SchedulerEvent::Activated { lane: Lane::North, duration: 4 };
        assert!(Notification::for_event(&activated, t0()).is_none());
    }

    #[test]
    fn expires_after_three_seconds() {
        let mut notifier = Notifier::default();
        notifier.publish(&SchedulerEvent::Cleared { lane: Lane::South }, t0());
        assert!(notifier.current(t0() + Duration::milliseconds(2999)).is_some());
        assert!(notifier.current(t0() + Duration::seconds(3)).is_none());
    }

    #[test]
    fn newer_notification_replaces_older_immediately() {
        let mut notifier = Notifier::default();
        notifier.publish(&SchedulerEvent::Cleared { lane: Lane::North }, t0());
        notifier.publish(&SchedulerEvent::Finished, t0() + Duration::seconds(1));
        let shown = notifier.current(t0() + Duration::seconds(1)).unwrap();
        assert_eq!(shown.message, ALL_PROCESSED);
        // The replacement owns its own window.
        assert!(notifier.current(t0() + Duration::milliseconds(3500)).is_some());
    }

    #[test]
    fn activation_does_not_disturb_current() {
        let mut notifier = Notifier::default();
        notifier.publish(&SchedulerEvent::Cleared { lane: Lane::North }, t0());
        let activated = SchedulerEvent::Activated { lane: Lane::East, duration: 2 };
        assert!(notifier.publish(&activated, t0()).is_none());
        assert_eq!(notifier.current(t0()).unwrap().lane, Some(Lane::North));
        notifier.clear();
        assert!(notifier.current(t0()).is_none());
    }
}
