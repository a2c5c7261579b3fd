//! MIDI port plumbing.
//!
//! One input port carries both controller gestures and amp telemetry; two
//! output ports go to the amp and the controller. Incoming messages are
//! pushed onto a channel drained by the main event loop, so all routing
//! happens on a single task.

use anyhow::{anyhow, Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::MidiConfig;
use crate::midi::{format_hex, MidiMessage};

const CLIENT_NAME: &str = "katana-gw";

/// Connected MIDI endpoints. Dropping this closes all ports.
pub struct MidiPorts {
    _input: MidiInputConnection<()>,
    amp: MidiOutputConnection,
    controller: MidiOutputConnection,
    send_pause: Duration,
}

impl MidiPorts {
    /// Open all three ports. Returns the receiver end of the input channel;
    /// once this call succeeds the output ports are ready and the startup
    /// queries may be sent.
    pub fn connect(config: &MidiConfig) -> Result<(Self, mpsc::Receiver<Vec<u8>>)> {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(1024);

        let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
        let (in_port, in_name) = find_port(
            midi_in.ports(),
            |p| midi_in.port_name(p).ok(),
            &config.input_port,
        )
        .ok_or_else(|| anyhow!("Input port '{}' not found", config.input_port))?;
        info!(port = %in_name, "connecting input");

        let input = midi_in
            .connect(
                &in_port,
                CLIENT_NAME,
                move |_timestamp, data, _| {
                    // Never block the MIDI callback thread
                    if tx.try_send(data.to_vec()).is_err() {
                        warn!("input queue full, dropping MIDI message");
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect input port '{}': {}", in_name, e))?;

        let amp = open_output(&config.katana_port, "amp")?;
        let controller = open_output(&config.controller_port, "controller")?;

        Ok((
            MidiPorts {
                _input: input,
                amp,
                controller,
                send_pause: Duration::from_millis(config.send_pause_ms),
            },
            rx,
        ))
    }

    /// Send a SysEx frame to the amp.
    ///
    /// Sends are paced with a short pause so the amp's SysEx intake keeps
    /// up; the pause blocks this task, which is exactly the rate limit
    /// wanted, since all sends happen from the one event loop.
    pub async fn send_to_amp(&mut self, frame: &[u8]) -> Result<()> {
        debug!(bytes = %format_hex(frame), "-> amp");
        self.amp
            .send(frame)
            .map_err(|e| anyhow!("Failed to send to amp: {}", e))?;
        if !self.send_pause.is_zero() {
            sleep(self.send_pause).await;
        }
        Ok(())
    }

    /// Send a feedback message to the controller.
    pub fn send_to_controller(&mut self, message: &MidiMessage) -> Result<()> {
        let bytes = message.to_bytes();
        debug!(bytes = %format_hex(&bytes), "-> controller");
        self.controller
            .send(&bytes)
            .map_err(|e| anyhow!("Failed to send to controller: {}", e))
    }
}

fn open_output(pattern: &str, label: &str) -> Result<MidiOutputConnection> {
    let midi_out = MidiOutput::new(CLIENT_NAME)
        .with_context(|| format!("Failed to create MIDI output for {}", label))?;
    let (port, name) = find_port(
        midi_out.ports(),
        |p| midi_out.port_name(p).ok(),
        pattern,
    )
    .ok_or_else(|| anyhow!("Output port '{}' ({}) not found", pattern, label))?;
    info!(port = %name, "connecting {} output", label);
    midi_out
        .connect(&port, CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to connect output port '{}': {}", name, e))
}

/// Pick the first port whose name contains `pattern`, case-insensitively.
fn find_port<P>(
    ports: Vec<P>,
    name_of: impl Fn(&P) -> Option<String>,
    pattern: &str,
) -> Option<(P, String)> {
    let pattern = pattern.to_lowercase();
    for port in ports {
        if let Some(name) = name_of(&port) {
            if name.to_lowercase().contains(&pattern) {
                return Some((port, name));
            }
        }
    }
    None
}

/// Names of the available MIDI ports, for `--list-ports`.
pub fn list_ports() -> Result<(Vec<String>, Vec<String>)> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();

    let midi_out = MidiOutput::new(CLIENT_NAME).context("Failed to create MIDI output")?;
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok((inputs, outputs))
}
