//! Katana Gateway - bidirectional bridge between a foot-pedal MIDI controller
//! and a Boss Katana MkII amplifier.
//!
//! Controller gestures (CC toggles, program changes, tap-tempo presses) are
//! translated into Katana SysEx commands; telemetry pushed back by the amp is
//! mirrored into an in-memory state model and turned into LED feedback so the
//! controller's indicators track the amp's true state.

pub mod config;
pub mod katana;
pub mod midi;
pub mod router;
pub mod state;
pub mod tap;
pub mod transport;
