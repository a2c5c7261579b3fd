//! MIDI message parsing and encoding.
//!
//! Only the message types the gateway routes are modeled; anything else
//! parses to `None` and is dropped by the event loop.

use std::fmt;

/// A decoded MIDI message.
///
/// `SysEx` carries the complete frame including the `F0`/`F7` markers, since
/// the Katana codec works on whole frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },

    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },

    /// Pitch Bend: channel (0-15), value (0-16383, 14-bit)
    PitchBend { channel: u8, value: u16 },

    /// System Exclusive: the full frame, `F0 .. F7`
    SysEx { data: Vec<u8> },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes.
    ///
    /// Returns `None` for truncated messages, running-status data, and
    /// system messages the gateway has no use for.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;

        // Running status (data byte first) is not maintained here.
        if status < 0x80 {
            return None;
        }

        if status == 0xF0 {
            // SysEx: keep the whole frame up to and including the terminator.
            let end = data.iter().position(|&b| b == 0xF7)?;
            return Some(MidiMessage::SysEx {
                data: data[..=end].to_vec(),
            });
        }
        if status >= 0xF0 {
            // Other system messages are irrelevant to the gateway.
            return None;
        }

        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: *data.get(1)? & 0x7F,
                velocity: *data.get(2)? & 0x7F,
            }),
            0x90 => {
                let note = *data.get(1)? & 0x7F;
                let velocity = *data.get(2)? & 0x7F;
                // Note On with velocity 0 is a Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note,
                        velocity: 0,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note,
                        velocity,
                    })
                }
            }
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                controller: *data.get(1)? & 0x7F,
                value: *data.get(2)? & 0x7F,
            }),
            0xC0 => Some(MidiMessage::ProgramChange {
                channel,
                program: *data.get(1)? & 0x7F,
            }),
            0xE0 => {
                let lsb = (*data.get(1)? & 0x7F) as u16;
                let msb = (*data.get(2)? & 0x7F) as u16;
                Some(MidiMessage::PitchBend {
                    channel,
                    value: (msb << 7) | lsb,
                })
            }
            _ => None,
        }
    }

    /// Encode the message back to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => vec![0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F],
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            MidiMessage::PitchBend { channel, value } => vec![
                0xE0 | (channel & 0x0F),
                (value & 0x7F) as u8,
                ((value >> 7) & 0x7F) as u8,
            ],
            MidiMessage::SysEx { ref data } => data.clone(),
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity),
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => write!(f, "CC ch:{} cc:{} v:{}", channel + 1, controller, value),
            MidiMessage::ProgramChange { channel, program } => {
                write!(f, "ProgramChange ch:{} p:{}", channel + 1, program)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "PitchBend ch:{} v:{}", channel + 1, value)
            }
            MidiMessage::SysEx { ref data } => write!(f, "SysEx {} bytes", data.len()),
        }
    }
}

/// Format MIDI bytes as a hex string for log output.
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_change_parsing() {
        let msg = MidiMessage::parse(&[0xBF, 16, 127]).unwrap();
        assert_eq!(
            msg,
            MidiMessage::ControlChange {
                channel: 15,
                controller: 16,
                value: 127,
            }
        );
    }

    #[test]
    fn test_program_change_parsing() {
        let msg = MidiMessage::parse(&[0xCF, 3]).unwrap();
        assert_eq!(
            msg,
            MidiMessage::ProgramChange {
                channel: 15,
                program: 3,
            }
        );
    }

    #[test]
    fn test_sysex_keeps_full_frame() {
        let frame = vec![0xF0, 0x41, 0x00, 0x33, 0xF7];
        let msg = MidiMessage::parse(&frame).unwrap();
        assert_eq!(msg, MidiMessage::SysEx { data: frame });
    }

    #[test]
    fn test_unterminated_sysex_is_rejected() {
        assert_eq!(MidiMessage::parse(&[0xF0, 0x41, 0x00]), None);
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let msg = MidiMessage::parse(&[0x90, 60, 0]).unwrap();
        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 0,
                note: 60,
                velocity: 0,
            }
        );
    }

    #[test]
    fn test_truncated_message() {
        assert_eq!(MidiMessage::parse(&[0xB0, 16]), None);
        assert_eq!(MidiMessage::parse(&[]), None);
    }

    #[test]
    fn test_encode_roundtrip() {
        let msg = MidiMessage::ControlChange {
            channel: 15,
            controller: 23,
            value: 64,
        };
        assert_eq!(MidiMessage::parse(&msg.to_bytes()), Some(msg));

        let msg = MidiMessage::ProgramChange {
            channel: 15,
            program: 5,
        };
        assert_eq!(MidiMessage::parse(&msg.to_bytes()), Some(msg));
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xF0, 0x41, 0x7F]), "F0 41 7F");
    }
}
