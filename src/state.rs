//! Mirrored device state.
//!
//! `AmpState` is the in-memory mirror of the amplifier settings the gateway
//! tracks; `ControllerState` mirrors the foot controller's indicator setup.
//! Both live for the process lifetime and are owned by the router, which is
//! the only place that mutates them. Mutations are compare-and-set so the
//! dispatch logic can suppress commands that would not change anything.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::katana::profile::EffectId;
use crate::tap::TapTempo;

/// Outcome of a compare-and-set mutation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    Unchanged,
}

impl Mutation {
    pub fn applied(self) -> bool {
        matches!(self, Mutation::Applied)
    }
}

/// Effect channel color. The amp cycles through three variants per effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Green,
    Red,
    Yellow,
}

impl Color {
    pub fn next(self) -> Color {
        match self {
            Color::Green => Color::Red,
            Color::Red => Color::Yellow,
            Color::Yellow => Color::Green,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Color> {
        match byte {
            0 => Some(Color::Green),
            1 => Some(Color::Red),
            2 => Some(Color::Yellow),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Color::Green => 0,
            Color::Red => 1,
            Color::Yellow => 2,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::Green => "green",
            Color::Red => "red",
            Color::Yellow => "yellow",
        })
    }
}

/// One of the two groups of four patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bank {
    Lower,
    Upper,
}

impl Bank {
    /// Interpret a bank-toggle CC value.
    pub fn from_cc(value: u8) -> Bank {
        if value >= 64 {
            Bank::Upper
        } else {
            Bank::Lower
        }
    }

    /// The bank an absolute patch number belongs to.
    pub fn of_patch(patch: u8) -> Bank {
        if patch > 4 {
            Bank::Upper
        } else {
            Bank::Lower
        }
    }

    /// Offset of this bank's patches relative to the 1-4 preset window.
    pub fn patch_offset(self) -> u8 {
        match self {
            Bank::Lower => 0,
            Bank::Upper => 4,
        }
    }

    /// The CC value representing this bank on the controller.
    pub fn cc_value(self) -> u8 {
        match self {
            Bank::Lower => 0,
            Bank::Upper => 127,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bank::Lower => "lower",
            Bank::Upper => "upper",
        })
    }
}

/// Mirrored state of a single effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectState {
    pub on: bool,
    /// `None` for effects without a color selector.
    pub color: Option<Color>,
    /// Tap timer, present on the delay lines only.
    pub tap: Option<TapTempo>,
}

impl EffectState {
    fn for_effect(id: EffectId) -> Self {
        EffectState {
            on: false,
            color: id.color_address().map(|_| Color::Green),
            tap: id.tap_address().map(|_| TapTempo::new()),
        }
    }
}

/// Patch number used before the first telemetry arrives.
const PATCH_UNKNOWN: u8 = 0;

/// The mirrored amplifier: every tracked effect plus the current patch and
/// bank. Patch 0 means "not yet synchronized".
#[derive(Debug, Clone)]
pub struct AmpState {
    effects: [EffectState; 9],
    patch: u8,
    bank: Bank,
}

impl AmpState {
    pub fn new() -> Self {
        AmpState {
            effects: EffectId::ALL.map(EffectState::for_effect),
            patch: PATCH_UNKNOWN,
            bank: Bank::Lower,
        }
    }

    pub fn effect(&self, id: EffectId) -> &EffectState {
        &self.effects[id as usize]
    }

    fn effect_mut(&mut self, id: EffectId) -> &mut EffectState {
        &mut self.effects[id as usize]
    }

    /// Switch an effect on or off.
    pub fn set_enabled(&mut self, id: EffectId, on: bool) -> Mutation {
        let effect = self.effect_mut(id);
        if effect.on == on {
            return Mutation::Unchanged;
        }
        effect.on = on;
        Mutation::Applied
    }

    /// Advance an effect to its next color. Always a change; `None` when the
    /// effect has no color selector.
    pub fn cycle_color(&mut self, id: EffectId) -> Option<Color> {
        let effect = self.effect_mut(id);
        let next = effect.color?.next();
        effect.color = Some(next);
        Some(next)
    }

    /// Overwrite an effect color from telemetry.
    pub fn set_color(&mut self, id: EffectId, color: Color) -> Mutation {
        let effect = self.effect_mut(id);
        if effect.color == Some(color) {
            return Mutation::Unchanged;
        }
        if effect.color.is_none() {
            return Mutation::Unchanged;
        }
        effect.color = Some(color);
        Mutation::Applied
    }

    pub fn tap_mut(&mut self, id: EffectId) -> Option<&mut TapTempo> {
        self.effect_mut(id).tap.as_mut()
    }

    /// Current patch (1-8), or 0 before the first synchronization.
    pub fn patch(&self) -> u8 {
        self.patch
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    /// Set the absolute patch, keeping the bank in step.
    pub fn set_patch(&mut self, patch: u8) -> Mutation {
        if self.patch == patch {
            return Mutation::Unchanged;
        }
        self.patch = patch;
        self.bank = Bank::of_patch(patch);
        Mutation::Applied
    }

    /// Switch banks, keeping the patch's position within the bank.
    ///
    /// Returns the new patch when a select command should follow; `None` when
    /// the bank already matches or the patch is still unknown (the bank is
    /// recorded either way).
    pub fn shift_bank(&mut self, bank: Bank) -> Option<u8> {
        if self.bank == bank {
            return None;
        }
        self.bank = bank;
        if !(1..=8).contains(&self.patch) {
            return None;
        }
        self.patch = match bank {
            Bank::Upper => self.patch + 4,
            Bank::Lower => self.patch - 4,
        };
        Some(self.patch)
    }
}

impl Default for AmpState {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirror of the foot controller's indicator setup. Never authoritative;
/// kept only to decide whether feedback commands are needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    /// The controller's active page (its own bank of pedals).
    pub page: u8,
    /// Which amp bank the controller's bank LED shows.
    pub amp_bank: Bank,
    /// The relative preset (1-4) whose LED is lit, if known.
    pub lit_preset: Option<u8>,
}

impl Default for ControllerState {
    fn default() -> Self {
        ControllerState {
            page: 1,
            amp_bank: Bank::Lower,
            lit_preset: None,
        }
    }
}
