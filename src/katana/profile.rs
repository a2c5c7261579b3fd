//! The Katana MkII memory map: tracked effects, their command addresses, and
//! the query battery that rebuilds mirrored state at startup.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::sysex;

/// Address written to select a patch (and pushed by the amp when the patch
/// changes).
pub const PATCH_SELECT: Address = Address::new([0x00, 0x01, 0x00, 0x00]);

/// Address that switches the amp into verbose mode, where it reports every
/// state change over SysEx.
const VERBOSE_MODE: Address = Address::new([0x7F, 0x00, 0x00, 0x01]);

/// A switchable amp feature tracked by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectId {
    Boost,
    Mod,
    Fx,
    Delay,
    Reverb,
    Delay2,
    PedalFx,
    Solo,
    GlobalEq,
}

impl EffectId {
    pub const ALL: [EffectId; 9] = [
        EffectId::Boost,
        EffectId::Mod,
        EffectId::Fx,
        EffectId::Delay,
        EffectId::Reverb,
        EffectId::Delay2,
        EffectId::PedalFx,
        EffectId::Solo,
        EffectId::GlobalEq,
    ];

    /// Address of the on/off switch, if the effect has one.
    ///
    /// The global EQ is color-only: its enable lives inside the patch data
    /// and is not switchable over this interface.
    pub fn toggle_address(self) -> Option<Address> {
        match self {
            EffectId::Boost => Some(Address::new([0x60, 0x00, 0x00, 0x10])),
            EffectId::Mod => Some(Address::new([0x60, 0x00, 0x01, 0x00])),
            EffectId::Fx => Some(Address::new([0x60, 0x00, 0x03, 0x00])),
            EffectId::Delay => Some(Address::new([0x60, 0x00, 0x05, 0x00])),
            EffectId::Reverb => Some(Address::new([0x60, 0x00, 0x05, 0x40])),
            EffectId::Delay2 => Some(Address::new([0x60, 0x00, 0x05, 0x20])),
            EffectId::PedalFx => Some(Address::new([0x60, 0x00, 0x05, 0x50])),
            EffectId::Solo => Some(Address::new([0x60, 0x00, 0x06, 0x14])),
            EffectId::GlobalEq => None,
        }
    }

    /// Address of the color selector (green/red/yellow), if the effect has one.
    pub fn color_address(self) -> Option<Address> {
        match self {
            EffectId::Boost => Some(Address::new([0x60, 0x00, 0x06, 0x39])),
            EffectId::Mod => Some(Address::new([0x60, 0x00, 0x06, 0x3A])),
            EffectId::Fx => Some(Address::new([0x60, 0x00, 0x06, 0x3B])),
            EffectId::Delay => Some(Address::new([0x60, 0x00, 0x06, 0x3C])),
            EffectId::Reverb => Some(Address::new([0x60, 0x00, 0x06, 0x3D])),
            EffectId::GlobalEq => Some(Address::new([0x00, 0x00, 0x00, 0x2E])),
            EffectId::Delay2 | EffectId::PedalFx | EffectId::Solo => None,
        }
    }

    /// Address of the delay-time register written by tap tempo, for the two
    /// delay lines.
    pub fn tap_address(self) -> Option<Address> {
        match self {
            EffectId::Delay => Some(Address::new([0x60, 0x00, 0x05, 0x02])),
            EffectId::Delay2 => Some(Address::new([0x60, 0x00, 0x05, 0x22])),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectId::Boost => "boost",
            EffectId::Mod => "mod",
            EffectId::Fx => "fx",
            EffectId::Delay => "delay",
            EffectId::Reverb => "reverb",
            EffectId::Delay2 => "delay2",
            EffectId::PedalFx => "pedal_fx",
            EffectId::Solo => "solo",
            EffectId::GlobalEq => "global_eq",
        }
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a telemetry address maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Toggle(EffectId),
    Color(EffectId),
    Patch,
}

static ADDRESS_TABLE: Lazy<HashMap<Address, Setting>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for id in EffectId::ALL {
        if let Some(addr) = id.toggle_address() {
            table.insert(addr, Setting::Toggle(id));
        }
        if let Some(addr) = id.color_address() {
            table.insert(addr, Setting::Color(id));
        }
    }
    table.insert(PATCH_SELECT, Setting::Patch);
    table
});

/// Look up the setting stored at `addr`, if the gateway tracks it.
pub fn setting_at(addr: Address) -> Option<Setting> {
    ADDRESS_TABLE.get(&addr).copied()
}

struct Query {
    addr: Address,
    size: [u8; 4],
}

/// The setting groups queried at startup, with the block sizes the amp
/// expects for each.
const QUERY_BATTERY: [Query; 9] = [
    // patch number
    Query {
        addr: PATCH_SELECT,
        size: [0x00, 0x00, 0x00, 0x02],
    },
    // boost block
    Query {
        addr: Address::new([0x60, 0x00, 0x00, 0x10]),
        size: [0x00, 0x00, 0x00, 0x48],
    },
    // mod block
    Query {
        addr: Address::new([0x60, 0x00, 0x01, 0x00]),
        size: [0x00, 0x00, 0x01, 0x00],
    },
    // fx block
    Query {
        addr: Address::new([0x60, 0x00, 0x03, 0x00]),
        size: [0x00, 0x00, 0x01, 0x00],
    },
    // delay block
    Query {
        addr: Address::new([0x60, 0x00, 0x05, 0x00]),
        size: [0x00, 0x00, 0x00, 0x1A],
    },
    // delay2 block
    Query {
        addr: Address::new([0x60, 0x00, 0x05, 0x20]),
        size: [0x00, 0x00, 0x00, 0x1A],
    },
    // reverb and pedal fx block
    Query {
        addr: Address::new([0x60, 0x00, 0x05, 0x40]),
        size: [0x00, 0x00, 0x00, 0x32],
    },
    // effect colors
    Query {
        addr: Address::new([0x60, 0x00, 0x06, 0x39]),
        size: [0x00, 0x00, 0x00, 0x05],
    },
    // global eq color
    Query {
        addr: Address::new([0x00, 0x00, 0x00, 0x2E]),
        size: [0x00, 0x00, 0x00, 0x01],
    },
];

/// The frames that rebuild the mirrored state: switch the amp into verbose
/// mode, then request every tracked setting group.
pub fn resync_frames() -> Vec<Vec<u8>> {
    let mut frames = vec![sysex::encode_set(VERBOSE_MODE, &[0x01])];
    frames.extend(
        QUERY_BATTERY
            .iter()
            .map(|q| sysex::encode_query(q.addr, q.size)),
    );
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_table_lookups() {
        assert_eq!(
            setting_at(Address::new([0x60, 0x00, 0x00, 0x10])),
            Some(Setting::Toggle(EffectId::Boost))
        );
        assert_eq!(
            setting_at(Address::new([0x60, 0x00, 0x06, 0x3D])),
            Some(Setting::Color(EffectId::Reverb))
        );
        assert_eq!(setting_at(PATCH_SELECT), Some(Setting::Patch));
        assert_eq!(setting_at(Address::new([0x60, 0x00, 0x7F, 0x00])), None);
    }

    #[test]
    fn test_table_covers_every_command_address() {
        // 8 toggles + 6 colors + the patch address
        assert_eq!(super::ADDRESS_TABLE.len(), 15);
    }

    #[test]
    fn test_resync_starts_with_verbose_mode() {
        let frames = resync_frames();
        assert_eq!(frames.len(), 10);
        assert_eq!(
            frames[0],
            vec![0xF0, 0x41, 0x00, 0x00, 0x00, 0x00, 0x33, 0x12, 0x7F, 0x00, 0x00, 0x01, 0x01, 0x7F, 0xF7]
        );
        // every following frame is a query
        for frame in &frames[1..] {
            assert_eq!(frame[7], sysex::CMD_QUERY);
        }
    }

    #[test]
    fn test_capability_consistency() {
        // the two delay lines are the only tap targets
        let taps: Vec<_> = EffectId::ALL
            .iter()
            .filter(|id| id.tap_address().is_some())
            .collect();
        assert_eq!(taps, vec![&EffectId::Delay, &EffectId::Delay2]);
        // everything except the global EQ can be switched
        assert!(EffectId::GlobalEq.toggle_address().is_none());
        assert_eq!(
            EffectId::ALL
                .iter()
                .filter(|id| id.toggle_address().is_some())
                .count(),
            8
        );
    }
}
