//! Boss Katana protocol support: device addressing, SysEx framing, and the
//! MkII memory map.

pub mod address;
pub mod profile;
pub mod sysex;

pub use address::{Address, AddressError};
