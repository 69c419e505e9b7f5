//! Port traits — the boundary between the control loop and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (GPIO, system timer) implement these traits.  The
//! [`ControlService`](super::service::ControlService) consumes them via
//! generics, so the domain core never touches hardware directly.  Delays
//! use the `embedded-hal` [`DelayNs`](embedded_hal::delay::DelayNs) trait
//! rather than a crate-local port — the confirmation and settle waits are
//! exactly what that trait exists for.

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: pins → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: instantaneous logic levels of the five input lines.
///
/// All methods report *logical* state: for the active-low lines
/// (modifier, buttons) `true` means asserted/held, regardless of the
/// electrical polarity the adapter sees.
pub trait InputPort {
    /// Encoder phase A level (high = true).
    fn encoder_a(&self) -> bool;

    /// Encoder phase B level (high = true).
    fn encoder_b(&self) -> bool;

    /// Step-size modifier held.
    fn modifier_asserted(&self) -> bool;

    /// Override button currently held down.
    fn override_pressed(&self) -> bool;

    /// Pump-stop button currently held down.
    fn pump_stop_pressed(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: monotonic timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic time since boot.  Microseconds drive the encoder debounce;
/// milliseconds drive everything else.
pub trait ClockPort {
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u32 {
        (self.now_us() / 1_000) as u32
    }
}
