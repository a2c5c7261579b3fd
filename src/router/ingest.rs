//! Telemetry ingest: SysEx dumps from the amp into mirrored state and LED
//! feedback.

use tracing::{debug, info, trace, warn};

use crate::katana::profile::{self, Setting};
use crate::katana::sysex;
use crate::state::Color;

use super::OutputEvent;

impl super::Router {
    /// Walk a telemetry dump address by address.
    ///
    /// Each data byte's address is the previous one incremented. Addresses
    /// the gateway does not track are skipped; tracked ones update the
    /// mirrored state, and changes that are visible on the controller emit
    /// feedback. The amp's checksum is not verified.
    pub(crate) fn on_sysex(&mut self, frame: &[u8]) -> Vec<OutputEvent> {
        let Some(dump) = sysex::decode(frame) else {
            trace!("ignoring non-Katana sysex");
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut address = dump.start;
        for (index, &byte) in dump.data.iter().enumerate() {
            if index > 0 {
                address = match address.next() {
                    Ok(next) => next,
                    Err(err) => {
                        warn!(error = %err, "telemetry walk aborted");
                        break;
                    }
                };
            }
            let Some(setting) = profile::setting_at(address) else {
                continue;
            };

            match setting {
                Setting::Toggle(effect) => {
                    let on = byte != 0;
                    if self.amp.set_enabled(effect, on).applied() {
                        info!(op = "telemetry_toggle", effect = %effect, on, "amp changed effect");
                        out.extend(self.effect_led_feedback(effect, on));
                    }
                }
                Setting::Color(effect) => {
                    // the controller has no color display; mirror only
                    match Color::from_byte(byte) {
                        Some(color) => {
                            let _ = self.amp.set_color(effect, color);
                        }
                        None => debug!(effect = %effect, byte, "unknown color value, ignored"),
                    }
                }
                Setting::Patch => {
                    // the amp reports the absolute patch in the final byte of
                    // the run
                    let patch = dump.data.last().copied().unwrap_or(byte);
                    out.extend(self.apply_patch_telemetry(patch));
                }
            }
        }
        out
    }

    fn apply_patch_telemetry(&mut self, patch: u8) -> Vec<OutputEvent> {
        if !(1..=8).contains(&patch) {
            debug!(patch, "patch outside 1-8, ignored");
            return Vec::new();
        }
        if !self.amp.set_patch(patch).applied() {
            return Vec::new();
        }
        info!(op = "telemetry_patch", patch, "amp switched patch");
        self.preset_feedback(patch)
    }
}
