//! Watch command implementation.
//!
//! Runs the engine against the configured consoles and prints each snapshot
//! whose contents changed until Ctrl+C.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use anyhow::{Context, Result};
use emulink_core::engine::CancelToken;
use emulink_core::{
    Detection, Engine, EngineConfig, GameSnapshot, ProfileDirectory, UdpTransport, load_consoles,
};
use owo_colors::OwoColorize;
use tracing::info;

/// How often the shutdown flag is checked while no snapshot arrives.
const IDLE_TICK: Duration = Duration::from_millis(200);

/// Run the watch command
pub fn run(config: EngineConfig, consoles_path: &Path, profiles: &Path, json: bool) -> Result<()> {
    let shutdown = Arc::new(CancelToken::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        println!("\nShutting down...");
        shutdown_ctrlc.cancel();
    })?;

    let consoles = load_consoles(consoles_path)
        .with_context(|| format!("Failed to load consoles from {}", consoles_path.display()))?;

    let transport = UdpTransport::with_timeout(config.host.as_str(), config.socket_timeout());
    let profiles = ProfileDirectory::new(profiles);

    let current_version = env!("CARGO_PKG_VERSION");
    if !json {
        println!("emulink v{}", current_version);
        println!("Host: {}", transport.host());
        println!("Profiles: {}", profiles.dir().display());
        println!("Probing {} console(s)... (Press Ctrl+C to quit)", consoles.len());
    }

    let engine = Engine::with_profile_source(transport, config, profiles);
    let snapshots = engine.subscribe();
    let detections = engine.subscribe_detection();
    engine.start(consoles)?;

    let mut last: Option<Arc<GameSnapshot>> = None;
    while !shutdown.is_cancelled() {
        while let Ok(detection) = detections.try_recv() {
            if !json {
                println!("{}", format_detection(&detection));
            }
        }

        let snapshot = match snapshots.recv_timeout(IDLE_TICK) {
            Ok(snapshot) => snapshot,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if last.as_deref().is_some_and(|prev| same_contents(prev, &snapshot)) {
            continue;
        }

        if json {
            println!("{}", serde_json::to_string(&*snapshot)?);
        } else {
            print!("{}", format_snapshot(&snapshot));
        }
        last = Some(snapshot);
    }

    engine.stop();
    info!("Watch stopped");
    Ok(())
}

/// Equal apart from the timestamp.
fn same_contents(a: &GameSnapshot, b: &GameSnapshot) -> bool {
    a.connected == b.connected
        && a.profile_id == b.profile_id
        && a.values == b.values
        && a.raw == b.raw
}

fn format_detection(detection: &Detection) -> String {
    match (&detection.game_id, &detection.console) {
        (Some(game_id), Some(console)) => {
            format!("{} {} on {}", "▶".green(), game_id.bold(), console)
        }
        _ => format!("{} No game detected", "■".red()),
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.3}", value)
    }
}

fn format_snapshot(snapshot: &GameSnapshot) -> String {
    let mut output = String::new();

    let status = if snapshot.connected {
        "connected".green().to_string()
    } else {
        "disconnected".red().to_string()
    };
    let profile = snapshot.profile_id.as_deref().unwrap_or("no profile");
    let _ = writeln!(output, "── {} [{}] ──", profile.bold(), status);

    for (id, value) in &snapshot.values {
        let mut line = format!("  {:<24} {:>12}", id, format_value(*value));
        if let Some(raw) = snapshot.raw.get(id)
            && raw != value
        {
            let _ = write!(line, "  {}", format!("(raw {})", format_value(*raw)).dimmed());
        }
        let _ = writeln!(output, "{}", line);
    }

    output
}
