//! Unified error types for the switch box firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's fault handling uniform.  All variants are `Copy`
//! so they can be passed through the recovery path without allocation.
//!
//! Rejected signal edges (debounce misses, rate-limit rejections, failed
//! press confirmations) are *not* errors — absence of an event is a normal
//! outcome and is only counted in [`Stats`](crate::diagnostics::Stats).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The host serial link failed.
    Transport(TransportError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// A write attempt failed.  The outgoing frame is dropped, never retried.
    WriteFailed,
    /// An inbound read returned an error.
    ReadFailed,
    /// Tear-down/re-create of the channel failed; the next health check
    /// (periodic, or on the next write failure) retries.
    ReinitFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::ReinitFailed => write!(f, "reinit failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
