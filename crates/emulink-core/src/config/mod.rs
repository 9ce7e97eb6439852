//! Engine configuration and limits.
//!
//! This module contains:
//! - `EngineConfig` - tunable host and timing settings, loadable from JSON
//! - JSON loaders for console lists and game profiles
//! - Transport, detection, polling, pointer, formula and bridge constants

mod loader;

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use loader::*;

/// UDP transport limits.
pub mod transport {
    /// Host the emulator memory server listens on.
    pub const DEFAULT_HOST: &str = "127.0.0.1";

    /// Port used before any console has been probed.
    pub const DEFAULT_PORT: u16 = 55355;

    /// Time to wait for a reply datagram.
    pub const SOCKET_TIMEOUT_MS: u64 = 500;

    /// Largest region a single read may request.
    pub const MAX_READ_SIZE: usize = 1024;

    /// Highest address reachable through the 32-bit wire header.
    pub const MAX_ADDRESS: u64 = 0xFFFF_FFFF;

    /// Stale datagrams discarded before each read.
    pub const DRAIN_ATTEMPTS: usize = 10;

    /// Receive timeout used while draining.
    pub const DRAIN_TIMEOUT_MS: u64 = 1;

    /// Minimum receive buffer, replies may be padded by the server.
    pub const MIN_RECV_BUFFER: usize = 256;
}

/// Game detection loop configuration.
pub mod detection {
    /// Consecutive failed ticks before the detected game is cleared.
    pub const MAX_DETECTION_FAILURES: u32 = 3;

    /// Delay after a tick that found a game.
    pub const SUCCESS_DELAY_MS: u64 = 3000;

    /// Delay after a tick that found nothing.
    pub const RETRY_DELAY_MS: u64 = 1000;

    /// Bytes read at a console's `idAddress` when `idSize` is absent.
    pub const DEFAULT_ID_SIZE: usize = 6;

    /// Shortest normalized identifier accepted as a game ID.
    pub const MIN_GAME_ID_LEN: usize = 4;
}

/// Polling loop configuration.
pub mod polling {
    /// Delay between two full sweeps over the profile's data points.
    pub const POLL_INTERVAL_MS: u64 = 200;
}

/// Pointer chain limits.
pub mod pointer {
    /// Maximum number of offsets in a pointer chain.
    pub const MAX_CHAIN_DEPTH: usize = 10;

    /// Width of a dereferenced pointer.
    pub const POINTER_SIZE: usize = 4;
}

/// Formula evaluator limits.
pub mod formula {
    /// Longest formula accepted, in characters.
    pub const MAX_EXPRESSION_LENGTH: usize = 256;

    /// Deepest parenthesis nesting accepted.
    pub const MAX_NESTING_DEPTH: usize = 20;
}

/// Script bridge limits.
pub mod bridge {
    /// Write calls accepted per rolling one-second window.
    pub const WRITE_MAX_PER_SECOND: u32 = 30;

    /// Length of the rate-limit window.
    pub const WRITE_WINDOW_MS: u64 = 1000;

    /// Sizes accepted by raw writes.
    pub const VALID_WRITE_SIZES: [usize; 3] = [1, 2, 4];
}

/// Tunable engine settings.
///
/// Every field has a default, so a partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub host: String,
    pub socket_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub detection_success_delay_ms: u64,
    pub detection_retry_delay_ms: u64,
    pub max_detection_failures: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: transport::DEFAULT_HOST.to_string(),
            socket_timeout_ms: transport::SOCKET_TIMEOUT_MS,
            poll_interval_ms: polling::POLL_INTERVAL_MS,
            detection_success_delay_ms: detection::SUCCESS_DELAY_MS,
            detection_retry_delay_ms: detection::RETRY_DELAY_MS,
            max_detection_failures: detection::MAX_DETECTION_FAILURES,
        }
    }
}

impl EngineConfig {
    /// Load settings from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn detection_success_delay(&self) -> Duration {
        Duration::from_millis(self.detection_success_delay_ms)
    }

    pub fn detection_retry_delay(&self) -> Duration {
        Duration::from_millis(self.detection_retry_delay_ms)
    }
}
