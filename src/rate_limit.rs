//! Fixed-window interrupt rate limiter.
//!
//! A failing encoder can generate thousands of spurious edges per second;
//! unbounded, those would starve the main loop.  The limiter admits at most
//! `max_per_window` interrupts per `window_ms` of wall-clock time and
//! rejects the rest, without ever disabling the signal.
//!
//! Called from encoder ISR context, so the state is atomics only — no
//! blocking, no critical sections.  Single ISR producer, so the
//! load/modify/store sequences below cannot interleave with themselves;
//! the main loop only ever calls [`reset`](InterruptRateLimiter::reset)
//! while the interrupt gate is closed.

use core::sync::atomic::{AtomicU32, Ordering};

pub struct InterruptRateLimiter {
    count: AtomicU32,
    window_start_ms: AtomicU32,
    max_per_window: AtomicU32,
    window_ms: AtomicU32,
}

impl InterruptRateLimiter {
    pub const fn new(max_per_window: u32, window_ms: u32) -> Self {
        Self {
            count: AtomicU32::new(0),
            window_start_ms: AtomicU32::new(0),
            max_per_window: AtomicU32::new(max_per_window),
            window_ms: AtomicU32::new(window_ms),
        }
    }

    /// Apply configured ceiling and window.  Main-loop only, at startup.
    pub fn configure(&self, max_per_window: u32, window_ms: u32) {
        self.max_per_window.store(max_per_window, Ordering::Relaxed);
        self.window_ms.store(window_ms, Ordering::Relaxed);
    }

    /// Decide whether one raw interrupt may pass.  ISR context.
    ///
    /// When the window has expired the counter restarts at 1 (the admission
    /// being granted right now), so exactly `max_per_window` interrupts pass
    /// per window under sustained load.
    pub fn admit(&self, now_ms: u32) -> bool {
        let start = self.window_start_ms.load(Ordering::Relaxed);
        if now_ms.wrapping_sub(start) >= self.window_ms.load(Ordering::Relaxed) {
            self.count.store(1, Ordering::Relaxed);
            self.window_start_ms.store(now_ms, Ordering::Relaxed);
            return true;
        }
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        n <= self.max_per_window.load(Ordering::Relaxed)
    }

    /// Zero the counter and restart the window.  Main-loop only, while the
    /// interrupt gate is closed.
    pub fn reset(&self, now_ms: u32) {
        self.count.store(0, Ordering::Relaxed);
        self.window_start_ms.store(now_ms, Ordering::Relaxed);
    }

    /// Interrupts counted in the current window.
    pub fn current_count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}
