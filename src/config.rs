//! Deployment configuration.
//!
//! Everything that varies between installations lives here: MIDI port names,
//! the controller's listen channel, the control map (which CC does what),
//! the per-page LED maps, and the handful of behavior flags the reference
//! deployments disagreed on. The built-in defaults reproduce the original
//! FCB1010/Wino2 deployment, so the gateway runs without a config file.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::katana::profile::EffectId;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    /// CC number -> gesture.
    #[serde(
        default = "default_controls",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub controls: HashMap<u8, ControlAction>,
    /// Controller page -> LED map.
    #[serde(default = "default_led_pages")]
    pub led_pages: HashMap<u8, LedPage>,
}

/// MIDI port configuration. Port names match by case-insensitive substring.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// The single input port carrying both controller gestures and amp
    /// telemetry.
    #[serde(default = "default_input_port")]
    pub input_port: String,
    /// Output port wired to the amp.
    #[serde(default = "default_katana_port")]
    pub katana_port: String,
    /// Output port wired to the controller.
    #[serde(default = "default_controller_port")]
    pub controller_port: String,
    /// Channel the controller listens on for feedback (1-16).
    #[serde(default = "default_controller_channel")]
    pub controller_channel: u8,
    /// Pause between SysEx sends to the amp, in milliseconds. Zero disables
    /// pacing.
    #[serde(default = "default_send_pause_ms")]
    pub send_pause_ms: u64,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig {
            input_port: default_input_port(),
            katana_port: default_katana_port(),
            controller_port: default_controller_port(),
            controller_channel: default_controller_channel(),
            send_pause_ms: default_send_pause_ms(),
        }
    }
}

/// Behavior flags that differ between deployments.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeploymentConfig {
    /// Subtracted from the (1-based) program number to get the preset slot.
    #[serde(default = "default_program_offset")]
    pub program_offset: u8,
    /// Whether a successful tap pairing clears the stored tap, so a third
    /// press starts a fresh pair instead of pairing with the second.
    #[serde(default = "default_true")]
    pub tap_clear_on_success: bool,
    /// Whether re-selecting the already-active patch is suppressed. Off by
    /// default: re-pressing the active preset deliberately reloads it.
    #[serde(default)]
    pub suppress_unchanged_patch: bool,
    /// How LED feedback is encoded for the controller firmware.
    #[serde(default)]
    pub feedback: FeedbackStyle,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        DeploymentConfig {
            program_offset: default_program_offset(),
            tap_clear_on_success: true,
            suppress_unchanged_patch: false,
            feedback: FeedbackStyle::default(),
        }
    }
}

/// LED feedback encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStyle {
    /// CC with value 127/0 on the LED's controller number.
    #[default]
    Cc,
    /// Program Change that "presses" the LED's pedal (Wino2 firmware);
    /// off-states cannot be expressed, so clear steps are skipped.
    Pc,
}

/// What a controller CC drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Switch an effect on (value >= 64) or off.
    ToggleEffect(EffectId),
    /// Advance an effect's color, on value 127 only.
    CycleColor(EffectId),
    /// Tap-tempo press for a delay line, on value 127 only.
    TapTempo(EffectId),
    /// Switch between the two patch banks (value 0/127).
    ToggleBank,
    /// The controller reporting the state of its own bank LED.
    ControllerBank,
    /// The controller reporting its active page; triggers a full resync.
    ControllerPage,
}

/// Which pedal number lights which indicator on one controller page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedPage {
    /// Effect -> LED number.
    #[serde(default)]
    pub effects: HashMap<EffectId, u8>,
    /// First preset LED; preset N lights `presets + N - 1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presets: Option<u8>,
    /// The bank indicator LED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amp_bank: Option<u8>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            midi: MidiConfig::default(),
            deployment: DeploymentConfig::default(),
            controls: default_controls(),
            led_pages: default_led_pages(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        Ok(config)
    }
}

// Default value functions

fn default_input_port() -> String {
    "katana-gw".to_string()
}
fn default_katana_port() -> String {
    "KATANA".to_string()
}
fn default_controller_port() -> String {
    "FCB1010".to_string()
}
fn default_controller_channel() -> u8 {
    16
}
fn default_send_pause_ms() -> u64 {
    2
}
fn default_program_offset() -> u8 {
    1
}
fn default_true() -> bool {
    true
}

/// The original deployment's control map.
fn default_controls() -> HashMap<u8, ControlAction> {
    use ControlAction::*;
    use EffectId::*;
    HashMap::from([
        (16, ToggleEffect(Boost)),
        (17, ToggleEffect(Mod)),
        (18, ToggleEffect(Fx)),
        (19, ToggleEffect(Delay)),
        (20, ToggleEffect(Reverb)),
        (21, ToggleEffect(Delay2)),
        (22, ToggleEffect(PedalFx)),
        (23, ToggleBank),
        (96, CycleColor(Boost)),
        (97, CycleColor(Mod)),
        (98, CycleColor(Fx)),
        (99, CycleColor(Reverb)),
        (100, TapTempo(Delay)),
        (101, TapTempo(Delay2)),
        (102, ToggleEffect(Solo)),
        (103, CycleColor(GlobalEq)),
        (125, ControllerBank),
        (126, ControllerPage),
    ])
}

/// The original deployment's per-page LED maps.
fn default_led_pages() -> HashMap<u8, LedPage> {
    use EffectId::*;
    HashMap::from([
        (
            1,
            LedPage {
                effects: HashMap::from([(Boost, 1), (Mod, 2), (Fx, 3), (Delay, 4), (Reverb, 5)]),
                presets: Some(6),
                amp_bank: Some(10),
            },
        ),
        (
            2,
            LedPage {
                effects: HashMap::from([
                    (Boost, 1),
                    (Mod, 2),
                    (Fx, 3),
                    (Delay, 4),
                    (Reverb, 5),
                    (Delay2, 6),
                    (PedalFx, 7),
                ]),
                presets: None,
                amp_bank: None,
            },
        ),
        (3, LedPage::default()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_reference_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.controls.len(), 18);
        assert_eq!(
            config.controls.get(&16),
            Some(&ControlAction::ToggleEffect(EffectId::Boost))
        );
        assert_eq!(config.controls.get(&23), Some(&ControlAction::ToggleBank));
        assert_eq!(
            config.controls.get(&100),
            Some(&ControlAction::TapTempo(EffectId::Delay))
        );
        assert_eq!(config.deployment.program_offset, 1);
        assert!(config.deployment.tap_clear_on_success);
        assert!(!config.deployment.suppress_unchanged_patch);

        let page1 = config.led_pages.get(&1).unwrap();
        assert_eq!(page1.presets, Some(6));
        assert_eq!(page1.amp_bank, Some(10));
        assert_eq!(page1.effects.get(&EffectId::Boost), Some(&1));
        assert!(config.led_pages.get(&3).unwrap().effects.is_empty());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.controls, config.controls);
        assert_eq!(parsed.led_pages, config.led_pages);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
midi:
  input_port: "UM-ONE"
deployment:
  tap_clear_on_success: false
  feedback: pc
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.midi.input_port, "UM-ONE");
        assert_eq!(config.midi.controller_channel, 16);
        assert!(!config.deployment.tap_clear_on_success);
        assert_eq!(config.deployment.feedback, FeedbackStyle::Pc);
        // untouched sections come from the reference deployment
        assert_eq!(config.controls.len(), 18);
    }

    #[test]
    fn test_control_action_yaml_shapes() {
        let yaml = r#"
controls:
  16:
    toggle_effect: boost
  23: toggle_bank
  100:
    tap_tempo: delay2
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.controls.get(&16),
            Some(&ControlAction::ToggleEffect(EffectId::Boost))
        );
        assert_eq!(config.controls.get(&23), Some(&ControlAction::ToggleBank));
        assert_eq!(
            config.controls.get(&100),
            Some(&ControlAction::TapTempo(EffectId::Delay2))
        );
    }
}
