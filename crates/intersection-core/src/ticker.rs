use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep, so cancellation is noticed promptly.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Time source that paces scheduler ticks.
pub trait Ticker {
    /// Block until the next tick is due. Returns `false` once cancelled; the
    /// caller must not tick after that.
    fn wait(&mut self) -> bool;
}

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// IntervalTicker
// ---------------------------------------------------------------------------

/// Wall-clock ticker with a fixed period.
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    next: Option<Instant>,
    cancel: CancelToken,
}

impl IntervalTicker {
    pub fn new(period: Duration, cancel: CancelToken) -> Self {
        Self {
            period,
            next: None,
            cancel,
        }
    }
}

impl Ticker for IntervalTicker {
    fn wait(&mut self) -> bool {
        let due = self.next.unwrap_or_else(|| Instant::now() + self.period);
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= due {
                break;
            }
            std::thread::sleep((due - now).min(CANCEL_POLL));
        }
        // Schedule from the due time, not from now, so ticks do not drift.
        self.next = Some(due + self.period);
        !self.cancel.is_cancelled()
    }
}

// ---------------------------------------------------------------------------
// ImmediateTicker
// ---------------------------------------------------------------------------

/// Ticks as fast as it is polled, optionally stopping after `limit` ticks.
#[derive(Debug, Default)]
pub struct ImmediateTicker {
    limit: Option<u64>,
    ticks: u64,
    cancel: CancelToken,
}

impl ImmediateTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Ticker for ImmediateTicker {
    fn wait(&mut self) -> bool {
        if self.cancel.is_cancelled() || self.limit.is_some_and(|l| self.ticks >= l) {
            return false;
        }
        self.ticks += 1;
        true
    }
}
