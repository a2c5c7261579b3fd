//! Controller LED feedback.
//!
//! Telemetry-driven state changes are reflected back to the controller so
//! its indicator LEDs keep tracking the amp. Which LED belongs to which
//! indicator depends on the controller's active page; gestures on unmapped
//! pages simply produce no feedback.

use tracing::debug;

use crate::config::FeedbackStyle;
use crate::katana::profile::EffectId;
use crate::midi::MidiMessage;
use crate::state::Bank;

use super::OutputEvent;

impl super::Router {
    fn feedback_channel(&self) -> u8 {
        self.config.midi.controller_channel.saturating_sub(1)
    }

    /// Encode a single LED update for the configured controller firmware.
    fn led_message(&self, led: u8, on: bool) -> MidiMessage {
        match self.config.deployment.feedback {
            FeedbackStyle::Cc => MidiMessage::ControlChange {
                channel: self.feedback_channel(),
                controller: led,
                value: if on { 127 } else { 0 },
            },
            // PC "presses" the pedal; the firmware toggles the LED itself
            FeedbackStyle::Pc => MidiMessage::ProgramChange {
                channel: self.feedback_channel(),
                program: led.saturating_sub(1),
            },
        }
    }

    /// Feedback for an effect whose on/off state changed on the amp side.
    pub(crate) fn effect_led_feedback(&self, effect: EffectId, on: bool) -> Vec<OutputEvent> {
        let led = self
            .config
            .led_pages
            .get(&self.controller.page)
            .and_then(|page| page.effects.get(&effect).copied());
        let Some(led) = led else {
            return Vec::new();
        };
        debug!(effect = %effect, led, on, "updating controller LED");
        vec![OutputEvent::ToController(self.led_message(led, on))]
    }

    /// Feedback for a patch change pushed by the amp: clear the previously
    /// lit preset LED, light the new one, then correct the bank indicator if
    /// it moved. Best-effort only; a lost frame is repaired by the next full
    /// resync.
    pub(crate) fn preset_feedback(&mut self, patch: u8) -> Vec<OutputEvent> {
        let bank = Bank::of_patch(patch);
        let relative = patch - bank.patch_offset();
        let style = self.config.deployment.feedback;

        let (presets, bank_led) = self
            .config
            .led_pages
            .get(&self.controller.page)
            .map(|page| (page.presets, page.amp_bank))
            .unwrap_or((None, None));

        let mut out = Vec::new();
        let previous = self.controller.lit_preset.take();

        if let Some(base) = presets {
            if style == FeedbackStyle::Cc {
                if let Some(prev) = previous {
                    out.push(OutputEvent::ToController(
                        self.led_message(base + prev - 1, false),
                    ));
                }
            }
            debug!(patch, preset = relative, "lighting preset LED");
            out.push(OutputEvent::ToController(
                self.led_message(base + relative - 1, true),
            ));
            self.controller.lit_preset = Some(relative);
        }

        if self.controller.amp_bank != bank {
            self.controller.amp_bank = bank;
            if let Some(led) = bank_led {
                debug!(bank = %bank, led, "updating bank LED");
                let message = match style {
                    FeedbackStyle::Cc => MidiMessage::ControlChange {
                        channel: self.feedback_channel(),
                        controller: led,
                        value: bank.cc_value(),
                    },
                    FeedbackStyle::Pc => MidiMessage::ProgramChange {
                        channel: self.feedback_channel(),
                        program: led.saturating_sub(1),
                    },
                };
                out.push(OutputEvent::ToController(message));
            }
        }

        out
    }
}
