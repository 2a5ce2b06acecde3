//! # Zigbee Link
//!
//! IEEE 802.15.4 receive path with a minimal PAN coordinator.
//!
//! This application replays captured sample bursts through the deframer,
//! the FCS codec and the coordinator, and logs every frame the coordinator
//! sends back.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use zigbee_link::bus::{self, run_block, PORT_DATA, PORT_PDU_IN, PORT_PDU_OUT};
use zigbee_link::config::{Config, LoggingConfig};
use zigbee_link::stream::replay::ReplaySource;
use zigbee_link::stream::{spawn_deframer, DeframerSettings};
use zigbee_link::zigbee::codec::CrcCodec;
use zigbee_link::zigbee::coordinator::Coordinator;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// How often the main loop checks whether the deframer is still alive
const SUPERVISE_INTERVAL_MS: u64 = 500;

/// Main entry point for Zigbee Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, else `config/default.toml`, else defaults)
///    - Set up console logging and, if configured, a rolling log file
///    - Start the FCS codec and coordinator tasks and the deframer thread
///
/// 2. **Main Loop**
///    - Log every frame leaving the coordinator
///    - Stop if the deframer thread exits on its own (fatal read error)
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop and join the deframer
///    - Let the tasks drain their inboxes and report counters
///
/// # Errors
///
/// Returns error if the configuration is invalid, the deframer cannot be
/// started, or the sample stream failed.
#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_source) = load_config()?;
    let _log_guard = init_logging(&config.logging);

    info!("Zigbee Link v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);

    let identity = config.coordinator.identity();
    info!(
        "PAN 0x{:04x}, source {:?}, EPID 0x{:016x}",
        identity.pan_id, identity.source, identity.extended_pan_id
    );

    let crc_mode = config.ingress_crc_mode()?;

    // deframer -> crc -> coordinator -> egress
    let (data_sink, data_rx) = bus::channel(PORT_DATA);
    let (frames_sink, frames_rx) = bus::channel(PORT_PDU_IN);
    let (egress_sink, mut egress_rx) = bus::channel(PORT_PDU_OUT);

    let crc_task = tokio::spawn(run_block(
        CrcCodec::new(crc_mode, config.crc.max_frame_len),
        data_rx,
        frames_sink,
    ));
    let coordinator_task = tokio::spawn(run_block(Coordinator::new(identity), frames_rx, egress_sink));

    let source = ReplaySource::new(&config.deframer.capture_path);
    info!("Reading samples from {}", source.path().display());
    let mut deframer = spawn_deframer(source, data_sink, DeframerSettings::from(&config.deframer))
        .context("failed to start deframer")?;

    info!("Press Ctrl+C to exit");

    let mut supervise = interval(Duration::from_millis(SUPERVISE_INTERVAL_MS));
    let mut frames_sent: u64 = 0;

    loop {
        tokio::select! {
            Some(pdu) = egress_rx.recv() => {
                frames_sent += 1;
                info!("Frame #{} out ({} bytes): {:02X?}", frames_sent, pdu.blob.len(), pdu.blob());
            }

            _ = supervise.tick() => {
                if deframer.is_finished() {
                    warn!("Deframer exited, shutting down...");
                    break;
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let stream_result = tokio::task::spawn_blocking(move || deframer.stop()).await?;

    // Deframer gone: inboxes close one after another
    while let Some(pdu) = egress_rx.recv().await {
        frames_sent += 1;
        info!("Frame #{} out ({} bytes): {:02X?}", frames_sent, pdu.blob.len(), pdu.blob());
    }

    let crc = crc_task.await??;
    let coordinator = coordinator_task.await??;

    info!("Frames dropped by FCS codec: {}", crc.dropped());
    info!("Coordinator: {:?}", coordinator.stats());
    info!("Total frames sent: {}", frames_sent);

    if let Err(e) = stream_result {
        error!("Sample stream failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// Load configuration, returning it with a description of where it came from
fn load_config() -> Result<(Config, String)> {
    load_config_from(std::env::args().nth(1), Path::new(DEFAULT_CONFIG_PATH))
}

/// Explicit path first, then `default_path` if it exists, then built-in defaults
fn load_config_from(explicit: Option<String>, default_path: &Path) -> Result<(Config, String)> {
    if let Some(path) = explicit {
        let config = Config::load(&path).with_context(|| format!("failed to load {}", path))?;
        return Ok((config, path));
    }

    if default_path.exists() {
        let config = Config::load(default_path)
            .with_context(|| format!("failed to load {}", default_path.display()))?;
        return Ok((config, default_path.display().to_string()));
    }

    Ok((Config::default(), "built-in defaults".to_string()))
}

/// Install the tracing subscriber
///
/// The returned guard flushes the file writer on drop and must live until
/// the end of `main`.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = if config.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}
