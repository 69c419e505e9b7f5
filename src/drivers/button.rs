//! Debounce bookkeeping for the momentary buttons.
//!
//! Active-low switches with pull-ups; GPIO fires on the falling edge.  The
//! main loop checks the debounce window here, then holds off for the
//! confirmation delay and re-reads the pin — a press that does not survive
//! the hold was contact bounce and is discarded.  The window timestamp
//! moves only when a press is actually confirmed, so a glitch never pushes
//! a real press out of the window.

/// Per-button debounce state.  Main-loop only.
pub struct DebouncedButton {
    last_accept_ms: u32,
    debounce_ms: u32,
}

impl DebouncedButton {
    pub fn new(debounce_ms: u32, now_ms: u32) -> Self {
        Self {
            last_accept_ms: now_ms,
            debounce_ms,
        }
    }

    /// Whether enough time has passed since the last confirmed press for a
    /// new one to be eligible.
    pub fn window_open(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_accept_ms) >= self.debounce_ms
    }

    /// Record a confirmed press.  `now_ms` is the time the pending flag was
    /// serviced, not the post-confirmation time.
    pub fn mark_accepted(&mut self, now_ms: u32) {
        self.last_accept_ms = now_ms;
    }

    pub fn last_accept_ms(&self) -> u32 {
        self.last_accept_ms
    }
}
