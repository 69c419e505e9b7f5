//! Control service — the main-loop dispatcher.
//!
//! [`ControlService`] owns the per-signal debounce state and the loop
//! timers.  Each [`poll`](ControlService::poll) drains the pending flags in
//! fixed order (encoder, override, pump-stop), runs periodic maintenance
//! and the heartbeat, and dispatches inbound host commands.  All I/O flows
//! through injected ports, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  InputPort ───▶ ┌────────────────────────────┐ ──▶ SerialLink<T>
//!  ClockPort ───▶ │       ControlService        │
//!  PendingFlags ─▶│  debounce · confirm · reset │
//!                 └────────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::diagnostics::Stats;
use crate::drivers::button::DebouncedButton;
use crate::drivers::encoder::QuadratureDecoder;
use crate::error::{Error, Result, TransportError};
use crate::events::{PendingFlags, Signal};
use crate::rate_limit::InterruptRateLimiter;
use crate::transport::{SerialLink, Transport};

use super::commands::HostCommand;
use super::events::ReportEvent;
use super::ports::{ClockPort, InputPort};

/// Dispatcher lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Normal operation.
    Running,
    /// A system reset is mutating shared state behind the closed gate.
    ResetInProgress,
    /// A loop fault was caught; recovery is underway.
    Faulted,
}

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// The control service orchestrates one signal-processing iteration at a
/// time.  The outer run-forever harness supplies the loop, the sleep, and
/// the watchdog feed.
pub struct ControlService<'a> {
    config: SystemConfig,
    flags: &'a PendingFlags,
    limiter: &'a InterruptRateLimiter,
    stats: &'a Stats,
    encoder: QuadratureDecoder,
    override_btn: DebouncedButton,
    pump_stop_btn: DebouncedButton,
    state: LoopState,
    last_maintenance_ms: u32,
    last_heartbeat_ms: u32,
}

impl<'a> ControlService<'a> {
    /// Snapshot initial state from the current pin readings and clock, and
    /// push the configured ceiling into the rate limiter.
    pub fn new(
        config: SystemConfig,
        flags: &'a PendingFlags,
        limiter: &'a InterruptRateLimiter,
        stats: &'a Stats,
        hw: &impl InputPort,
        clock: &impl ClockPort,
    ) -> Self {
        let now_us = clock.now_us();
        let now_ms = clock.now_ms();

        limiter.configure(config.max_interrupts_per_window, config.rate_window_ms);
        limiter.reset(now_ms);

        let encoder = QuadratureDecoder::new(config.encoder_debounce_us, hw.encoder_a(), now_us);
        let override_btn = DebouncedButton::new(config.button_debounce_ms, now_ms);
        let pump_stop_btn = DebouncedButton::new(config.button_debounce_ms, now_ms);

        Self {
            config,
            flags,
            limiter,
            stats,
            encoder,
            override_btn,
            pump_stop_btn,
            state: LoopState::Running,
            last_maintenance_ms: now_ms,
            last_heartbeat_ms: now_ms,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one loop iteration: drain the three signals in fixed order, then
    /// the periodic duties.  The caller sleeps `loop_sleep_ms` afterwards.
    ///
    /// Transport write failures are handled at the link boundary (frame
    /// dropped, health check fired); the error only propagates out of here
    /// when the link stayed unhealthy through the inline recovery — that is
    /// the unrecovered-fault case the caller answers with [`recover`].
    ///
    /// [`recover`]: ControlService::recover
    pub fn poll<T: Transport>(
        &mut self,
        hw: &impl InputPort,
        link: &mut SerialLink<T>,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
    ) -> Result<()> {
        let now_ms = clock.now_ms();

        self.process_encoder(hw, link, clock, delay)?;
        self.process_override(hw, link, clock, delay)?;
        self.process_pump_stop(hw, link, clock, delay)?;

        if now_ms.wrapping_sub(self.last_maintenance_ms) >= self.config.maintenance_interval_ms {
            self.run_maintenance(link, delay);
            self.last_maintenance_ms = now_ms;
        }

        if self.config.heartbeat_enabled
            && now_ms.wrapping_sub(self.last_heartbeat_ms) >= self.config.heartbeat_interval_ms
        {
            self.emit(link, ReportEvent::Heartbeat, delay)?;
            self.last_heartbeat_ms = now_ms;
        }

        self.poll_host_command(hw, link, clock, delay);

        Ok(())
    }

    // ── Signal processing ─────────────────────────────────────

    fn process_encoder<T: Transport>(
        &mut self,
        hw: &impl InputPort,
        link: &mut SerialLink<T>,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
    ) -> Result<()> {
        // Clear before processing: an edge arriving mid-processing raises
        // the flag again and is serviced next iteration.
        if !self.flags.take(Signal::Encoder) {
            return Ok(());
        }

        let now_us = clock.now_us();
        let event = self.encoder.on_edge(
            now_us,
            hw.encoder_a(),
            hw.encoder_b(),
            hw.modifier_asserted(),
        );

        if let Some(event) = event {
            self.stats.record_step();
            self.emit(link, event, delay)?;
        }
        Ok(())
    }

    fn process_override<T: Transport>(
        &mut self,
        hw: &impl InputPort,
        link: &mut SerialLink<T>,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
    ) -> Result<()> {
        if !self.flags.take(Signal::Override) {
            return Ok(());
        }

        let now_ms = clock.now_ms();
        if !self.override_btn.window_open(now_ms) {
            return Ok(());
        }

        // Hold off and re-read: a press that vanished within the
        // confirmation window was contact bounce.
        delay.delay_ms(self.config.button_confirm_ms);
        if hw.override_pressed() {
            self.override_btn.mark_accepted(now_ms);
            self.stats.record_override();
            self.emit(link, ReportEvent::Override, delay)?;
        }
        Ok(())
    }

    fn process_pump_stop<T: Transport>(
        &mut self,
        hw: &impl InputPort,
        link: &mut SerialLink<T>,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
    ) -> Result<()> {
        if !self.flags.take(Signal::PumpStop) {
            return Ok(());
        }

        let now_ms = clock.now_ms();
        if !self.pump_stop_btn.window_open(now_ms) {
            return Ok(());
        }

        delay.delay_ms(self.config.button_confirm_ms);
        if hw.pump_stop_pressed() {
            self.pump_stop_btn.mark_accepted(now_ms);
            self.stats.record_pump_stop();
            self.emit(link, ReportEvent::PumpStop, delay)?;
        }
        Ok(())
    }

    // ── Emission ──────────────────────────────────────────────

    /// Write one frame.  A failed write already fired the link's inline
    /// health check; the frame is gone either way (best-effort channel).
    /// Only a link that is *still* down afterwards escalates to the caller.
    fn emit<T: Transport>(
        &mut self,
        link: &mut SerialLink<T>,
        event: ReportEvent,
        delay: &mut impl DelayNs,
    ) -> Result<()> {
        let frame = event.encode();
        info!("{}", frame.trim_end());

        match link.send(frame.as_bytes(), delay) {
            Ok(()) => Ok(()),
            Err(_) if link.is_healthy() => Ok(()),
            Err(e) => Err(Error::Transport(e)),
        }
    }

    // ── Periodic duties ───────────────────────────────────────

    /// Drop stale inbound bytes and verify the transport still answers.
    fn run_maintenance<T: Transport>(&mut self, link: &mut SerialLink<T>, delay: &mut impl DelayNs) {
        link.drain_rx();
        link.ensure_healthy(delay);
    }

    // ── Host commands ─────────────────────────────────────────

    fn poll_host_command<T: Transport>(
        &mut self,
        hw: &impl InputPort,
        link: &mut SerialLink<T>,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
    ) {
        let byte = match link.try_read_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => return,
            Err(_) => {
                // Undecodable inbound traffic is not worth a fault, but a
                // failing read may mean the channel is wedged.
                link.ensure_healthy(delay);
                return;
            }
        };

        match HostCommand::decode(byte) {
            Some(HostCommand::Reset) => {
                info!("host requested reset");
                self.system_reset(hw, link, clock, delay);
            }
            Some(HostCommand::Stats) => {
                info!("stats: {}", self.stats.snapshot());
            }
            None => {}
        }
    }

    // ── Reset & recovery ──────────────────────────────────────

    /// Return to a clean state without restarting the device.
    ///
    /// The interrupt gate closes first and reopens last: every mutation in
    /// between — flags, encoder baseline, limiter, RX buffer — completes
    /// (settle delay included) before a new interrupt can be accepted.
    pub fn system_reset<T: Transport>(
        &mut self,
        hw: &impl InputPort,
        link: &mut SerialLink<T>,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
    ) {
        self.state = LoopState::ResetInProgress;
        self.flags.lock();

        self.flags.clear_all();
        self.encoder.resnapshot(hw.encoder_a(), clock.now_us());
        self.limiter.reset(clock.now_ms());
        link.drain_rx();

        delay.delay_ms(self.config.reset_settle_ms);
        self.flags.unlock();
        self.state = LoopState::Running;
        info!("system reset complete");
    }

    /// Answer an unrecovered loop fault: transport recovery (when enabled)
    /// followed by a full system reset.  The loop resumes afterwards — the
    /// box is unattended, so continued operation beats giving up.
    pub fn recover<T: Transport>(
        &mut self,
        hw: &impl InputPort,
        link: &mut SerialLink<T>,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
    ) {
        self.state = LoopState::Faulted;
        if self.config.auto_recovery && !link.ensure_healthy(delay) {
            warn!("transport still down after recovery attempt");
        }
        self.system_reset(hw, link, clock, delay);
    }
}
