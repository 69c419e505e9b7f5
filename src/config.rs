//! System configuration parameters
//!
//! All tunable parameters for the switch box firmware.  There is no
//! persistent store (the box is stateless across power cycles); the defaults
//! below are the shipping values and are dumped to the local log at boot.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Debounce ---
    /// Minimum spacing between accepted encoder edges (microseconds)
    pub encoder_debounce_us: u32,
    /// Minimum spacing between accepted button presses (milliseconds)
    pub button_debounce_ms: u32,
    /// Hold time a button must survive before a press is confirmed (ms)
    pub button_confirm_ms: u32,

    // --- Interrupt rate limiting ---
    /// Maximum encoder interrupts admitted per window
    pub max_interrupts_per_window: u32,
    /// Rate-limit window length (milliseconds)
    pub rate_window_ms: u32,

    // --- Main loop timing ---
    /// Periodic maintenance interval (milliseconds)
    pub maintenance_interval_ms: u32,
    /// Heartbeat interval (milliseconds)
    pub heartbeat_interval_ms: u32,
    /// Sleep at the end of each loop iteration (milliseconds)
    pub loop_sleep_ms: u32,

    // --- Recovery ---
    /// Settle delay before re-creating a wedged transport (milliseconds)
    pub reinit_settle_ms: u32,
    /// Settle delay at the end of a system reset, before the interrupt
    /// gate reopens (milliseconds)
    pub reset_settle_ms: u32,

    // --- Feature toggles ---
    /// Emit the periodic `OK` heartbeat frame
    pub heartbeat_enabled: bool,
    /// Run transport recovery before the system reset on a loop fault
    pub auto_recovery: bool,

    // --- Transport ---
    /// Host UART line speed (8N1)
    pub uart_baud: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Debounce
            encoder_debounce_us: 1_500,
            button_debounce_ms: 50,
            button_confirm_ms: 5,

            // Rate limiting
            max_interrupts_per_window: 1_000,
            rate_window_ms: 1_000,

            // Main loop
            maintenance_interval_ms: 5_000,
            heartbeat_interval_ms: 10_000,
            loop_sleep_ms: 5,

            // Recovery
            reinit_settle_ms: 50,
            reset_settle_ms: 10,

            // Toggles
            heartbeat_enabled: true,
            auto_recovery: true,

            // Transport
            uart_baud: 115_200,
        }
    }
}
