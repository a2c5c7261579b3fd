//! katana-gw - bridge a foot-pedal MIDI controller and a Boss Katana MkII
//! amplifier.

use anyhow::Result;
use clap::Parser;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use katana_gw::config::AppConfig;
use katana_gw::midi::{format_hex, MidiMessage};
use katana_gw::router::{InputEvent, OutputEvent, Router};
use katana_gw::transport::{self, MidiPorts};

/// Katana Gateway - full Katana MkII control from a MIDI foot controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults are used without one)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    if args.list_ports {
        let (inputs, outputs) = transport::list_ports()?;
        println!("Input ports:");
        for name in inputs {
            println!("  {}", name);
        }
        println!("Output ports:");
        for name in outputs {
            println!("  {}", name);
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path);
            AppConfig::load(path).await?
        }
        None => {
            info!("No config file given, using built-in defaults");
            AppConfig::default()
        }
    };

    let router = Router::new(config.clone());
    run(router, &config).await
}

async fn run(mut router: Router, config: &AppConfig) -> Result<()> {
    let (mut ports, mut midi_rx) = MidiPorts::connect(&config.midi)?;
    info!("MIDI ports connected");

    // The ports are open: rebuild the mirrored amp state before anything
    // else happens.
    for frame in router.resync_frames() {
        ports.send_to_amp(&frame).await?;
    }
    info!("Startup queries sent, mirroring amp state");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            maybe_raw = midi_rx.recv() => {
                let Some(raw) = maybe_raw else {
                    warn!("MIDI input channel closed");
                    break;
                };
                let Some(message) = MidiMessage::parse(&raw) else {
                    debug!(bytes = %format_hex(&raw), "unparseable MIDI, ignored");
                    continue;
                };
                let Some(event) = InputEvent::from_midi(&message) else {
                    continue;
                };
                for output in router.handle_event(event, now_ms()) {
                    match output {
                        OutputEvent::ToAmp(frame) => {
                            if let Err(e) = ports.send_to_amp(&frame).await {
                                warn!("Send to amp failed: {:#}", e);
                            }
                        }
                        OutputEvent::ToController(message) => {
                            if let Err(e) = ports.send_to_controller(&message) {
                                warn!("Send to controller failed: {:#}", e);
                            }
                        }
                    }
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Katana gateway shutdown complete");
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
