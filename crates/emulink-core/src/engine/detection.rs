use std::sync::Arc;

use tracing::{debug, info, trace};

use super::{CancelToken, Detection, Shared};
use crate::model::ConsoleConfig;
use crate::resolve::{normalize_game_id, parse_hex};
use crate::transport::MemoryTransport;

/// Probe each console in order and return the first game found.
pub fn probe_consoles<T: MemoryTransport + ?Sized>(
    transport: &T,
    consoles: &[ConsoleConfig],
) -> Option<Detection> {
    consoles
        .iter()
        .find_map(|console| probe_console(transport, console))
}

fn probe_console<T: MemoryTransport + ?Sized>(
    transport: &T,
    console: &ConsoleConfig,
) -> Option<Detection> {
    let address = parse_hex(&console.id_address)?;
    match transport.read_on_port(console.port, address, console.id_size) {
        Ok(bytes) => match normalize_game_id(&bytes) {
            Some(game_id) => Some(Detection::found(game_id, &console.console_tag, console.port)),
            None => {
                trace!("No game ID on {} ({:02X?})", console.name, bytes);
                None
            }
        },
        Err(e) => {
            trace!("{} not answering on port {}: {}", console.name, console.port, e);
            None
        }
    }
}

/// Outcome of one detection tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionEvent {
    /// A game was found; `changed` if it differs from the current detection.
    Found { detection: Detection, changed: bool },
    Missed,
    /// The failure threshold was just reached. Emitted once per failure streak.
    Lost,
}

/// Debounces detection so a few dropped probes don't clear the game.
#[derive(Debug)]
pub struct DetectionTracker {
    failures: u32,
    threshold: u32,
    current: Detection,
}

impl DetectionTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            failures: 0,
            threshold: threshold.max(1),
            current: Detection::default(),
        }
    }

    pub fn observe(&mut self, probe: Option<Detection>) -> DetectionEvent {
        match probe {
            Some(detection) => {
                self.failures = 0;
                let changed = detection != self.current;
                self.current = detection.clone();
                DetectionEvent::Found { detection, changed }
            }
            None => {
                self.failures = self.failures.saturating_add(1);
                if self.failures == self.threshold {
                    self.current = Detection::default();
                    DetectionEvent::Lost
                } else {
                    DetectionEvent::Missed
                }
            }
        }
    }

    pub fn current(&self) -> &Detection {
        &self.current
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl<T: MemoryTransport + 'static> Shared<T> {
    pub(super) fn run_detection(
        self: &Arc<Self>,
        consoles: &[ConsoleConfig],
        cancel: &CancelToken,
    ) {
        let mut tracker = DetectionTracker::new(self.config.max_detection_failures);

        while !cancel.is_cancelled() {
            let probe = probe_consoles(&self.transport, consoles);
            if cancel.is_cancelled() {
                break;
            }

            let found = probe.is_some();
            match tracker.observe(probe) {
                DetectionEvent::Found {
                    detection,
                    changed: true,
                } => {
                    info!(
                        "Detected {} on {}",
                        detection.game_id.as_deref().unwrap_or_default(),
                        detection.console.as_deref().unwrap_or_default()
                    );
                    self.detection.publish(detection.clone());
                    self.on_game_found(&detection);
                }
                DetectionEvent::Found { .. } => {}
                DetectionEvent::Missed => {
                    debug!("No game detected ({} in a row)", tracker.failures());
                }
                DetectionEvent::Lost => {
                    if self.detection.publish_if_changed(Detection::default()) {
                        info!("Game lost after {} failed probes", tracker.failures());
                    }
                    self.on_game_lost();
                }
            }

            let delay = if found {
                self.config.detection_success_delay()
            } else {
                self.config.detection_retry_delay()
            };
            if cancel.wait(delay) {
                break;
            }
        }
        debug!("Detection loop stopped");
    }
}
