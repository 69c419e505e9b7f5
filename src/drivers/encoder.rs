//! Quadrature encoder edge decoder.
//!
//! ## Hardware
//!
//! Mechanical detented encoder, phases A and B with external pull-downs.
//! GPIO fires on the rising edge of phase A only; phase B and the modifier
//! button are sampled when the main loop gets around to the pending flag.
//! Direction comes from phase B's level at that moment: B low → clockwise
//! (positive step), B high → counter-clockwise.
//!
//! Mechanical bounce on a detented encoder produces edge bursts well under
//! a millisecond apart; the debounce window (1.5 ms) swallows those without
//! eating legitimate fast spins.

use crate::app::events::{Direction, ReportEvent};

/// Per-edge decoder state.  Main-loop only.
pub struct QuadratureDecoder {
    last_a: bool,
    last_accept_us: u64,
    debounce_us: u32,
}

impl QuadratureDecoder {
    /// Snapshot the initial phase-A level and clock at startup.
    pub fn new(debounce_us: u32, initial_a: bool, now_us: u64) -> Self {
        Self {
            last_a: initial_a,
            last_accept_us: now_us,
            debounce_us,
        }
    }

    /// Process one pending phase-A edge.
    ///
    /// `a`, `b` and `modifier` are the pin levels sampled *now*, not at
    /// interrupt time — on a detented encoder the phases are stable by the
    /// time the main loop services the flag.  Returns the step event, or
    /// `None` when the edge is debounce-rejected or phase A has already
    /// fallen back low.  The accept timestamp moves only on emission.
    pub fn on_edge(
        &mut self,
        now_us: u64,
        a: bool,
        b: bool,
        modifier: bool,
    ) -> Option<ReportEvent> {
        if now_us.wrapping_sub(self.last_accept_us) < u64::from(self.debounce_us) {
            return None;
        }

        self.last_a = a;
        if !a {
            return None;
        }

        let magnitude = if modifier { 10 } else { 1 };
        let direction = if b { Direction::Down } else { Direction::Up };
        self.last_accept_us = now_us;
        Some(ReportEvent::Step {
            magnitude,
            direction,
        })
    }

    /// Re-baseline from current readings.  Used by the system reset while
    /// the interrupt gate is closed.
    pub fn resnapshot(&mut self, a: bool, now_us: u64) {
        self.last_a = a;
        self.last_accept_us = now_us;
    }

    /// Last phase-A level observed by a processed edge.
    pub fn last_a(&self) -> bool {
        self.last_a
    }

    /// Timestamp of the most recently accepted edge.
    pub fn last_accept_us(&self) -> u64 {
        self.last_accept_us
    }
}
