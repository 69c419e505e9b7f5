//! Switch Box Firmware — Main Entry Point
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │   GpioInputs      Esp32TimeAdapter     UartTransport          │
//! │   (InputPort)     (ClockPort/DelayNs)  (Transport)            │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │            ControlService (pure logic)                  │  │
//! │  │  debounce · rate limit · reset · heartbeat              │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                                                               │
//! │  ISRs ──▶ PendingFlags (atomics) ──▶ main loop drain          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use switchbox::adapters::hardware::GpioInputs;
use switchbox::adapters::time::{Esp32TimeAdapter, SystemDelay};
use switchbox::adapters::uart::UartTransport;
use switchbox::app::service::ControlService;
use switchbox::config::SystemConfig;
use switchbox::diagnostics::STATS;
use switchbox::drivers::watchdog::Watchdog;
use switchbox::drivers::hw_init;
use switchbox::events::{ENCODER_RATE, FLAGS};
use switchbox::transport::SerialLink;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("switchbox v{}", env!("CARGO_PKG_VERSION"));

    let config = SystemConfig::default();
    match serde_json::to_string(&config) {
        Ok(json) => info!("config: {}", json),
        Err(e) => warn!("config dump failed: {}", e),
    }

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Pin setup failure is critical — log and halt; the watchdog is
        // not armed yet, so this stays visible on the console.
        error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    let clock = Esp32TimeAdapter::new();
    let mut delay = SystemDelay::new();
    let hw = GpioInputs;

    let uart = match UartTransport::new(config.uart_baud) {
        Ok(u) => u,
        Err(e) => return Err(anyhow::anyhow!("host UART init failed: {}", e)),
    };
    let mut link = SerialLink::new(uart, config.reinit_settle_ms);

    // ── 3. Control service ────────────────────────────────────
    // Constructed before the ISRs go live so the rate limiter and the
    // encoder baseline are in place when the first edge fires.
    let mut service = ControlService::new(
        config.clone(),
        &FLAGS,
        &ENCODER_RATE,
        &STATS,
        &hw,
        &clock,
    );

    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {} — continuing without interrupts", e);
    }

    let watchdog = Watchdog::new();

    info!("encoder + buttons monitor running");

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        if let Err(e) = service.poll(&hw, &mut link, &clock, &mut delay) {
            warn!("loop fault: {} — recovering", e);
            service.recover(&hw, &mut link, &clock, &mut delay);
        }

        watchdog.feed();
        delay.delay_ms(config.loop_sleep_ms);
    }
}
