//! Host UART transport.
//!
//! Implements [`Transport`] over the ESP-IDF UART driver with raw `sys`
//! calls, the same pattern as the one-shot GPIO setup in
//! [`hw_init`](crate::drivers::hw_init).  `reopen` deletes and reinstalls
//! the driver with the original configuration — the recovery primitive
//! [`SerialLink`](crate::transport::SerialLink) relies on when the
//! peripheral wedges.

use esp_idf_svc::sys::*;
use log::info;

use crate::error::TransportError;
use crate::pins;
use crate::transport::Transport;

const RX_BUF_SIZE: i32 = 256;
const TX_BUF_SIZE: i32 = 256;

pub struct UartTransport {
    port: uart_port_t,
    baud: u32,
}

impl UartTransport {
    /// Install the UART driver on the host port.  8N1, no flow control.
    pub fn new(baud: u32) -> Result<Self, TransportError> {
        let transport = Self {
            port: pins::HOST_UART_NUM as uart_port_t,
            baud,
        };
        transport.install()?;
        info!("uart: host link up ({} baud 8N1)", baud);
        Ok(transport)
    }

    fn install(&self) -> Result<(), TransportError> {
        let cfg = uart_config_t {
            baud_rate: self.baud as i32,
            data_bits: uart_word_length_t_UART_DATA_8_BITS,
            parity: uart_parity_t_UART_PARITY_DISABLE,
            stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
            flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
            ..Default::default()
        };

        // SAFETY: one-shot driver setup on a port this adapter owns; main
        // task only — the ISRs never touch the UART.
        unsafe {
            let ret = uart_param_config(self.port, &cfg);
            if ret != ESP_OK {
                return Err(TransportError::ReinitFailed);
            }
            let ret = uart_set_pin(
                self.port,
                pins::UART_TX_GPIO,
                pins::UART_RX_GPIO,
                -1, // RTS unused
                -1, // CTS unused
            );
            if ret != ESP_OK {
                return Err(TransportError::ReinitFailed);
            }
            let ret = uart_driver_install(self.port, RX_BUF_SIZE, TX_BUF_SIZE, 0, core::ptr::null_mut(), 0);
            if ret != ESP_OK {
                return Err(TransportError::ReinitFailed);
            }
        }
        Ok(())
    }
}

impl Transport for UartTransport {
    type Error = TransportError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        // SAFETY: buf outlives the call; zero tick timeout keeps this
        // non-blocking.
        let n = unsafe {
            uart_read_bytes(
                self.port,
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                0,
            )
        };
        if n < 0 {
            return Err(TransportError::ReadFailed);
        }
        Ok(n as usize)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        // SAFETY: data outlives the call; the driver copies into its TX
        // ring before returning.
        let n = unsafe { uart_write_bytes(self.port, data.as_ptr().cast(), data.len()) };
        if n < 0 || (n as usize) != data.len() {
            return Err(TransportError::WriteFailed);
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        // SAFETY: blocks until the TX FIFO drains; main task only.
        let ret = unsafe { uart_wait_tx_done(self.port, 100) };
        if ret != ESP_OK {
            return Err(TransportError::WriteFailed);
        }
        Ok(())
    }

    fn available(&self) -> bool {
        let mut buffered: usize = 0;
        // SAFETY: queries driver state only.
        let ret = unsafe { uart_get_buffered_data_len(self.port, &mut buffered) };
        ret == ESP_OK && buffered > 0
    }

    fn reopen(&mut self) -> Result<(), TransportError> {
        // SAFETY: delete tolerates a driver in any state; install below
        // re-creates it with the original configuration.
        unsafe {
            uart_driver_delete(self.port);
        }
        self.install()
    }
}
