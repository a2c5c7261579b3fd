//! The routing core.
//!
//! The router owns the mirrored amp and controller state and maps each
//! inbound event to zero or more outbound events: controller gestures become
//! Katana SysEx commands (dispatch), amp telemetry becomes state updates and
//! controller LED feedback (ingest). It is purely synchronous; the event
//! loop feeds it one event at a time and ships whatever it returns.

mod dispatch;
mod feedback;
mod ingest;


use crate::config::AppConfig;
use crate::katana::profile;
use crate::midi::MidiMessage;
use crate::state::{AmpState, ControllerState};

/// An inbound event, already parsed off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    /// `program` is 1-based (wire byte + 1), matching the numbering printed
    /// on controller panels.
    ProgramChange {
        channel: u8,
        program: u8,
    },
    /// A complete SysEx frame, `F0 .. F7`.
    SysEx {
        data: Vec<u8>,
    },
}

impl InputEvent {
    /// Convert a parsed MIDI message into a routable event. Messages the
    /// router has no use for (notes, pitch bend) map to `None`.
    pub fn from_midi(message: &MidiMessage) -> Option<Self> {
        match message {
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => Some(InputEvent::ControlChange {
                channel: *channel,
                controller: *controller,
                value: *value,
            }),
            MidiMessage::ProgramChange { channel, program } => Some(InputEvent::ProgramChange {
                channel: *channel,
                program: program + 1,
            }),
            MidiMessage::SysEx { data } => Some(InputEvent::SysEx { data: data.clone() }),
            _ => None,
        }
    }
}

/// An outbound event, addressed to one of the two output ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// A raw SysEx frame for the amp.
    ToAmp(Vec<u8>),
    /// A feedback message for the controller.
    ToController(MidiMessage),
}

/// Maps inbound events to outbound events against the mirrored state.
pub struct Router {
    pub(crate) config: AppConfig,
    pub(crate) amp: AmpState,
    pub(crate) controller: ControllerState,
}

impl Router {
    pub fn new(config: AppConfig) -> Self {
        Router {
            config,
            amp: AmpState::new(),
            controller: ControllerState::default(),
        }
    }

    /// Process one inbound event. `now_ms` is the arrival time in
    /// milliseconds, used only for tap-tempo pairing.
    pub fn handle_event(&mut self, event: InputEvent, now_ms: u64) -> Vec<OutputEvent> {
        match event {
            InputEvent::ControlChange {
                controller, value, ..
            } => self.on_control_change(controller, value, now_ms),
            InputEvent::ProgramChange { program, .. } => self.on_program_change(program),
            InputEvent::SysEx { data } => self.on_sysex(&data),
        }
    }

    /// The startup battery: switch the amp into verbose mode and query every
    /// tracked setting group, so ingest can rebuild the mirrored state.
    pub fn resync_frames(&self) -> Vec<Vec<u8>> {
        profile::resync_frames()
    }

    /// Read access to the mirrored amp state.
    pub fn amp_state(&self) -> &AmpState {
        &self.amp
    }

    /// Read access to the mirrored controller state.
    pub fn controller_state(&self) -> &ControllerState {
        &self.controller
    }
}
