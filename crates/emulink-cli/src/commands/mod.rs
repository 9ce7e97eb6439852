//! CLI command implementations.

pub mod eval;
pub mod read;
pub mod watch;
pub mod write;

use std::path::Path;

use emulink_core::EngineConfig;
use tracing::{info, warn};

/// Load engine settings, falling back to defaults when absent or invalid.
pub fn load_engine_config(path: Option<&Path>) -> EngineConfig {
    let Some(path) = path else {
        return EngineConfig::default();
    };

    match EngineConfig::load(path) {
        Ok(config) => {
            info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_uses_defaults() {
        assert_eq!(load_engine_config(None), EngineConfig::default());
        assert_eq!(
            load_engine_config(Some(Path::new("does/not/exist.json"))),
            EngineConfig::default()
        );
    }
}
