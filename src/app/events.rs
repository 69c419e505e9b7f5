//! Outbound wire events.
//!
//! The host-side protocol is newline-terminated ASCII and is frozen — the
//! desktop software parses these frames byte-for-byte:
//!
//! | Frame    | Meaning                                   |
//! |----------|-------------------------------------------|
//! | `+1\n`   | one encoder step clockwise                |
//! | `-10\n`  | ten steps counter-clockwise (modifier)    |
//! | `OV\n`   | override button confirmed                 |
//! | `PS\n`   | pump-stop button confirmed                |
//! | `OK\n`   | heartbeat                                 |

use core::fmt::Write as _;

// Frames use bare `\n`, never `\r\n`; writeln! matches the wire format.

/// Largest frame is `-10\n` plus slack.
pub const FRAME_CAP: usize = 8;

/// A frame on its way to the host.
pub type Frame = heapless::String<FRAME_CAP>;

/// Encoder step direction as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise, reported with a leading `+`.
    Up,
    /// Counter-clockwise, reported with a leading `-`.
    Down,
}

/// Events emitted by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEvent {
    /// Confirmed encoder movement.
    Step { magnitude: u8, direction: Direction },
    /// Confirmed override button press.
    Override,
    /// Confirmed pump-stop button press.
    PumpStop,
    /// Periodic liveness frame.
    Heartbeat,
}

impl ReportEvent {
    /// Render the frame, newline included.
    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new();
        // FRAME_CAP covers every variant; the writes cannot fail.
        let _ = match self {
            Self::Step {
                magnitude,
                direction,
            } => {
                let sign = match direction {
                    Direction::Up => '+',
                    Direction::Down => '-',
                };
                writeln!(frame, "{sign}{magnitude}")
            }
            Self::Override => writeln!(frame, "OV"),
            Self::PumpStop => writeln!(frame, "PS"),
            Self::Heartbeat => writeln!(frame, "OK"),
        };
        frame
    }
}
