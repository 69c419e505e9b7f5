//! Interrupt-to-main-loop handoff.
//!
//! Each input line gets exactly one pending flag.  The ISR performs a single
//! atomic store — no I/O, no debounce, no blocking — and everything else is
//! deferred to the main loop, which clears the flag *before* processing so
//! an edge arriving mid-processing lands on the next iteration instead of
//! being lost.
//!
//! ```text
//! ┌─────────────┐ set            ┌───────────────┐ take          ┌───────────┐
//! │ encoder ISR │───────────────▶│               │──────────────▶│           │
//! │ override ISR│───────────────▶│ PendingFlags  │──────────────▶│ Main Loop │
//! │ pump ISR    │───────────────▶│ (atomic bools)│──────────────▶│           │
//! └─────────────┘                └───────────────┘               └───────────┘
//! ```
//!
//! The gate bit is the only cross-context synchronisation primitive: while
//! it is closed no flag transitions false→true, which lets a system reset
//! mutate shared state without racing the ISRs.  Discipline is strictly
//! write-by-producer / clear-by-consumer; there is no blocking lock anywhere
//! an ISR can reach.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::diagnostics::STATS;
use crate::rate_limit::InterruptRateLimiter;

/// The three interrupt-capable input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Encoder,
    Override,
    PumpStop,
}

/// One pending flag per signal plus the reset gate.
pub struct PendingFlags {
    encoder: AtomicBool,
    override_btn: AtomicBool,
    pump_stop: AtomicBool,
    gate_closed: AtomicBool,
}

/// Process-wide flag block, shared between the GPIO ISRs and the main loop.
pub static FLAGS: PendingFlags = PendingFlags::new();

/// Rate limiter for the encoder line, consulted from ISR context.
pub static ENCODER_RATE: InterruptRateLimiter = InterruptRateLimiter::new(1_000, 1_000);

impl Default for PendingFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingFlags {
    pub const fn new() -> Self {
        Self {
            encoder: AtomicBool::new(false),
            override_btn: AtomicBool::new(false),
            pump_stop: AtomicBool::new(false),
            gate_closed: AtomicBool::new(false),
        }
    }

    fn flag(&self, signal: Signal) -> &AtomicBool {
        match signal {
            Signal::Encoder => &self.encoder,
            Signal::Override => &self.override_btn,
            Signal::PumpStop => &self.pump_stop,
        }
    }

    /// ISR side: mark the signal pending.  A no-op while the gate is
    /// closed.  Returns whether the flag was actually raised.
    pub fn raise(&self, signal: Signal) -> bool {
        if self.gate_closed.load(Ordering::Acquire) {
            return false;
        }
        self.flag(signal).store(true, Ordering::Release);
        true
    }

    /// Main-loop side: consume the signal's flag, clearing it in the same
    /// atomic step.
    pub fn take(&self, signal: Signal) -> bool {
        self.flag(signal).swap(false, Ordering::AcqRel)
    }

    /// Non-consuming read, for tests and diagnostics.
    pub fn is_pending(&self, signal: Signal) -> bool {
        self.flag(signal).load(Ordering::Acquire)
    }

    /// Drop all pending work.  Main-loop only, with the gate closed.
    pub fn clear_all(&self) {
        self.encoder.store(false, Ordering::Release);
        self.override_btn.store(false, Ordering::Release);
        self.pump_stop.store(false, Ordering::Release);
    }

    /// Close the gate: all subsequent `raise` calls become no-ops.
    pub fn lock(&self) {
        self.gate_closed.store(true, Ordering::Release);
    }

    /// Reopen the gate.  Must be the last step of a reset.
    pub fn unlock(&self) {
        self.gate_closed.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.gate_closed.load(Ordering::Acquire)
    }
}

// ── ISR entry points ──────────────────────────────────────────
//
// Registered against the GPIO edges in `drivers::hw_init`.  Everything here
// must stay safe for interrupt context: atomics only.

/// Encoder phase-A rising edge.  `now_ms` comes from the high-resolution
/// timer, read inside the ISR shim.
pub fn encoder_isr(now_ms: u32) {
    if FLAGS.is_locked() {
        STATS.record_blocked();
        return;
    }
    if ENCODER_RATE.admit(now_ms) {
        FLAGS.raise(Signal::Encoder);
    } else {
        STATS.record_blocked();
    }
}

/// Override button falling edge.
pub fn override_isr() {
    FLAGS.raise(Signal::Override);
}

/// Pump-stop button falling edge.
pub fn pump_stop_isr() {
    FLAGS.raise(Signal::PumpStop);
}
