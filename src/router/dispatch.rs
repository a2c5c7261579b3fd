//! Controller gesture dispatch: CC and PC events in, amp commands out.

use tracing::{debug, info, trace, warn};

use crate::config::ControlAction;
use crate::katana::profile::{self, EffectId};
use crate::katana::sysex;
use crate::state::Bank;
use crate::tap;

use super::OutputEvent;

impl super::Router {
    pub(crate) fn on_control_change(
        &mut self,
        controller: u8,
        value: u8,
        now_ms: u64,
    ) -> Vec<OutputEvent> {
        let Some(action) = self.config.controls.get(&controller).copied() else {
            trace!(cc = controller, value, "unmapped CC, passing over");
            return Vec::new();
        };

        match action {
            ControlAction::ToggleEffect(effect) => self.toggle_effect(effect, value),
            // momentary pedals also report their release; only act on the press
            ControlAction::CycleColor(effect) if value == 127 => self.cycle_color(effect),
            ControlAction::TapTempo(effect) if value == 127 => self.tap_tempo(effect, now_ms),
            ControlAction::CycleColor(_) | ControlAction::TapTempo(_) => Vec::new(),
            ControlAction::ToggleBank => self.toggle_bank(value),
            ControlAction::ControllerBank => {
                self.controller.amp_bank = Bank::from_cc(value);
                Vec::new()
            }
            ControlAction::ControllerPage => self.controller_page(value),
        }
    }

    /// Select a patch from a program change. `program` is 1-based.
    pub(crate) fn on_program_change(&mut self, program: u8) -> Vec<OutputEvent> {
        let slot = i16::from(program) - i16::from(self.config.deployment.program_offset);
        if !(1..=4).contains(&slot) {
            debug!(program, "program change outside the preset window, ignored");
            return Vec::new();
        }
        let patch = slot as u8 + self.amp.bank().patch_offset();

        let changed = self.amp.set_patch(patch).applied();
        if !changed && self.config.deployment.suppress_unchanged_patch {
            debug!(patch, "patch unchanged, select suppressed");
            return Vec::new();
        }
        // the controller lights the pressed preset pedal itself
        self.controller.lit_preset = Some(slot as u8);

        info!(op = "select_patch", patch, "selecting patch");
        vec![OutputEvent::ToAmp(sysex::encode_set(
            profile::PATCH_SELECT,
            &[0x00, patch],
        ))]
    }

    fn toggle_effect(&mut self, effect: EffectId, value: u8) -> Vec<OutputEvent> {
        let Some(addr) = effect.toggle_address() else {
            warn!(effect = %effect, "effect has no on/off switch");
            return Vec::new();
        };
        let on = value >= 64;
        if !self.amp.set_enabled(effect, on).applied() {
            debug!(effect = %effect, on, "toggle already matches, suppressed");
            return Vec::new();
        }
        info!(op = "toggle_effect", effect = %effect, on, "switching effect");
        vec![OutputEvent::ToAmp(sysex::encode_set(addr, &[u8::from(on)]))]
    }

    fn cycle_color(&mut self, effect: EffectId) -> Vec<OutputEvent> {
        let Some(addr) = effect.color_address() else {
            warn!(effect = %effect, "effect has no color selector");
            return Vec::new();
        };
        let Some(color) = self.amp.cycle_color(effect) else {
            return Vec::new();
        };
        info!(op = "cycle_color", effect = %effect, color = %color, "advancing color");
        vec![OutputEvent::ToAmp(sysex::encode_set(
            addr,
            &[color.as_byte()],
        ))]
    }

    fn tap_tempo(&mut self, effect: EffectId, now_ms: u64) -> Vec<OutputEvent> {
        let Some(addr) = effect.tap_address() else {
            warn!(effect = %effect, "effect is not a delay line");
            return Vec::new();
        };
        let clear_on_success = self.config.deployment.tap_clear_on_success;
        let Some(timer) = self.amp.tap_mut(effect) else {
            return Vec::new();
        };
        let Some(interval) = timer.record(now_ms, clear_on_success) else {
            debug!(effect = %effect, "first tap of a pair");
            return Vec::new();
        };
        let (hi, lo) = tap::encode_interval(interval);
        info!(op = "tap_tempo", effect = %effect, interval_ms = interval, "setting delay time");
        vec![OutputEvent::ToAmp(sysex::encode_set(addr, &[hi, lo]))]
    }

    fn toggle_bank(&mut self, value: u8) -> Vec<OutputEvent> {
        let bank = Bank::from_cc(value);
        if bank == self.amp.bank() {
            debug!(bank = %bank, "bank already matches, suppressed");
            return Vec::new();
        }
        let Some(patch) = self.amp.shift_bank(bank) else {
            warn!(bank = %bank, "bank changed before the first patch sync, nothing to select");
            return Vec::new();
        };
        info!(op = "toggle_bank", bank = %bank, patch, "switching bank");
        vec![OutputEvent::ToAmp(sysex::encode_set(
            profile::PATCH_SELECT,
            &[0x00, patch],
        ))]
    }

    /// The controller switched to another of its own pages. Its LEDs start
    /// blank there, so re-query the amp and let ingest repaint them.
    fn controller_page(&mut self, page: u8) -> Vec<OutputEvent> {
        self.controller.page = page;
        self.controller.lit_preset = None;
        info!(op = "controller_page", page, "controller page changed, resyncing amp state");
        profile::resync_frames()
            .into_iter()
            .map(OutputEvent::ToAmp)
            .collect()
    }
}
