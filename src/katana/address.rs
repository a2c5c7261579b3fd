//! Katana memory addresses.
//!
//! The device identifies each setting by a four-byte address where every
//! byte stays in the 7-bit MIDI data range. Telemetry dumps carry a starting
//! address plus a run of data bytes; the address of each subsequent byte is
//! obtained by incrementing.

use std::fmt;
use thiserror::Error;

/// A location in the Katana's memory map: four 7-bit bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 4]);

/// Address arithmetic failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// Incrementing would have to carry past the second-to-last byte.
    /// The device never streams runs long enough to reach this, so the walk
    /// aborts rather than fabricating an address.
    #[error("address increment carried past 0x7f twice at {0}")]
    CarryOverflow(Address),
}

impl Address {
    /// Build an address from four bytes. Bytes are masked into the 7-bit range.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Address([
            bytes[0] & 0x7F,
            bytes[1] & 0x7F,
            bytes[2] & 0x7F,
            bytes[3] & 0x7F,
        ])
    }

    /// Build an address from a wire slice; `None` unless it is exactly four
    /// 7-bit bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 4] = bytes.try_into().ok()?;
        if bytes.iter().any(|&b| b > 0x7F) {
            return None;
        }
        Some(Address(bytes))
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// The address of the next data position.
    ///
    /// Adds one to the last byte; `0x7F` wraps to `0x00` and carries into the
    /// next-more-significant byte. Only a single carry level is supported;
    /// a second-level rollover is an error (see [`AddressError`]).
    pub fn next(self) -> Result<Address, AddressError> {
        let [a, b, c, d] = self.0;
        if d < 0x7F {
            Ok(Address([a, b, c, d + 1]))
        } else if c < 0x7F {
            Ok(Address([a, b, c + 1, 0x00]))
        } else {
            Err(AddressError::CarryOverflow(self))
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{:02x} {:02x} {:02x} {:02x}", a, b, c, d)
    }
}
