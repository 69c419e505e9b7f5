//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions/pulls and registers the edge interrupts
//! using raw ESP-IDF sys calls.  Called once from `main()` before the
//! control loop starts.  The ISR shims registered here do nothing but
//! forward into the flag primitives in [`events`](crate::events) — no
//! I/O, no blocking, nothing that could deadlock against the main loop.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

// ── GPIO inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // Encoder phases idle low: external pull-downs, keep the internals off.
    let pulled_down = [pins::ENCODER_A_GPIO, pins::ENCODER_B_GPIO];
    for &pin in &pulled_down {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: one-shot pin setup from the main task, before the loop.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    // Modifier and buttons are active-low switches to ground.
    let pulled_up = [pins::MODIFIER_GPIO, pins::OVERRIDE_GPIO, pins::PUMP_STOP_GPIO];
    for &pin in &pulled_up {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: as above.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe from main context and ISRs.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    // Host stand-in: pins read high, so the active-low lines report idle.
    true
}

// ── GPIO ISR service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn encoder_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::events::encoder_isr(now_ms);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn override_gpio_isr(_arg: *mut core::ffi::c_void) {
    crate::events::override_isr();
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pump_stop_gpio_isr(_arg: *mut core::ffi::c_void) {
    crate::events::pump_stop_isr();
}

/// Install the per-pin GPIO ISR service and register the edge handlers.
/// Call after [`init_peripherals`] and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handlers registered
    // below only touch the lock-free flag/limiter atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        // Encoder phase A: rising edge.
        gpio_set_intr_type(pins::ENCODER_A_GPIO, gpio_int_type_t_GPIO_INTR_POSEDGE);
        gpio_isr_handler_add(
            pins::ENCODER_A_GPIO,
            Some(encoder_gpio_isr),
            core::ptr::null_mut(),
        );
        gpio_intr_enable(pins::ENCODER_A_GPIO);

        // Buttons: falling edge (active-low with pull-ups).
        gpio_set_intr_type(pins::OVERRIDE_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        gpio_isr_handler_add(
            pins::OVERRIDE_GPIO,
            Some(override_gpio_isr),
            core::ptr::null_mut(),
        );
        gpio_intr_enable(pins::OVERRIDE_GPIO);

        gpio_set_intr_type(pins::PUMP_STOP_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        gpio_isr_handler_add(
            pins::PUMP_STOP_GPIO,
            Some(pump_stop_gpio_isr),
            core::ptr::null_mut(),
        );
        gpio_intr_enable(pins::PUMP_STOP_GPIO);

        info!("hw_init: ISR service installed (encoder, override, pump_stop)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
