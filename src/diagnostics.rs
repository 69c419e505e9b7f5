//! Runtime event counters.
//!
//! `blocked` is incremented from interrupt context, so every field is an
//! atomic; the emission counters are main-loop-only but live in the same
//! block so a snapshot reads coherently.  Counters are never reset — they
//! track totals since boot and are read back on demand via the host `'s'`
//! command (local log only, nothing on the wire).

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Totals since boot.
pub struct Stats {
    steps: AtomicU32,
    overrides: AtomicU32,
    pump_stops: AtomicU32,
    blocked: AtomicU32,
}

/// Process-wide counters shared between the ISRs and the main loop.
pub static STATS: Stats = Stats::new();

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            steps: AtomicU32::new(0),
            overrides: AtomicU32::new(0),
            pump_stops: AtomicU32::new(0),
            blocked: AtomicU32::new(0),
        }
    }

    pub fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_override(&self) {
        self.overrides.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pump_stop(&self) {
        self.pump_stops.fetch_add(1, Ordering::Relaxed);
    }

    /// Called from encoder ISR context when an interrupt is not admitted.
    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            steps: self.steps.load(Ordering::Relaxed),
            overrides: self.overrides.load(Ordering::Relaxed),
            pump_stops: self.pump_stops.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the counters, suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub steps: u32,
    pub overrides: u32,
    pub pump_stops: u32,
    pub blocked: u32,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps={} overrides={} pump_stops={} blocked={}",
            self.steps, self.overrides, self.pump_stops, self.blocked
        )
    }
}
