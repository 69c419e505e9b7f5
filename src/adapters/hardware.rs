//! GPIO input adapter.
//!
//! Thin [`InputPort`] implementation over the raw pin reads in
//! [`hw_init`](crate::drivers::hw_init).  Polarity is normalised here: the
//! modifier and both buttons are active-low (pull-up, switch to ground), so
//! a low pin reads back as "asserted".

use crate::app::ports::InputPort;
use crate::drivers::hw_init;
use crate::pins;

/// Reads the five input lines through the configured GPIOs.
pub struct GpioInputs;

impl InputPort for GpioInputs {
    fn encoder_a(&self) -> bool {
        hw_init::gpio_read(pins::ENCODER_A_GPIO)
    }

    fn encoder_b(&self) -> bool {
        hw_init::gpio_read(pins::ENCODER_B_GPIO)
    }

    fn modifier_asserted(&self) -> bool {
        !hw_init::gpio_read(pins::MODIFIER_GPIO)
    }

    fn override_pressed(&self) -> bool {
        !hw_init::gpio_read(pins::OVERRIDE_GPIO)
    }

    fn pump_stop_pressed(&self) -> bool {
        !hw_init::gpio_read(pins::PUMP_STOP_GPIO)
    }
}
