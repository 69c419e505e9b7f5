//! GPIO pin assignments for the switch box main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Quadrature encoder (mechanical, detented)
// ---------------------------------------------------------------------------

/// Encoder phase A — interrupt on the rising edge.  External pull-down.
pub const ENCODER_A_GPIO: i32 = 15;
/// Encoder phase B — sampled (never interrupt-driven).  External pull-down.
pub const ENCODER_B_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Buttons (momentary, active-low with pull-ups)
// ---------------------------------------------------------------------------

/// Step-size modifier.  Held low → encoder steps count ×10.
pub const MODIFIER_GPIO: i32 = 13;
/// Manual override button — interrupt on the falling edge.
pub const OVERRIDE_GPIO: i32 = 16;
/// Pump emergency-stop button — interrupt on the falling edge.
pub const PUMP_STOP_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Host UART
// ---------------------------------------------------------------------------

/// UART port carrying the event protocol to the host.
pub const HOST_UART_NUM: i32 = 1;
pub const UART_TX_GPIO: i32 = 43;
pub const UART_RX_GPIO: i32 = 44;
