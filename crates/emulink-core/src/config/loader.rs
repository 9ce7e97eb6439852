use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::engine::ProfileSource;
use crate::error::{Error, Result};
use crate::model::{ConsoleConfig, ProfileConfig};
use crate::resolve::game_key_tiers;

/// Load the console list (a JSON array) from `path`.
///
/// A missing file yields the built-in Dolphin consoles.
pub fn load_consoles<P: AsRef<Path>>(path: P) -> Result<Vec<ConsoleConfig>> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("{} not found, using built-in consoles", path.display());
            return Ok(ConsoleConfig::builtin());
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map_err(|e| Error::ConfigParseError(format!("{}: {}", path.display(), e)))
}

/// A directory of `<key>.json` profile files.
#[derive(Debug, Clone)]
pub struct ProfileDirectory {
    dir: PathBuf,
}

impl ProfileDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the profile for `game_id`: the full ID first, then its 4- and
    /// 3-character prefixes. The first file that exists is used.
    pub fn load(&self, game_id: &str) -> Result<ProfileConfig> {
        if game_id.is_empty() || !game_id.chars().all(char::is_alphanumeric) {
            return Err(Error::ProfileNotFound(game_id.to_string()));
        }

        for key in game_key_tiers(Some(game_id)) {
            let path = self.dir.join(format!("{}.json", key));
            if !path.is_file() {
                continue;
            }
            debug!("Loading profile {}", path.display());
            let content = fs::read_to_string(&path)?;
            return serde_json::from_str(&content)
                .map_err(|e| Error::ConfigParseError(format!("{}: {}", path.display(), e)));
        }

        Err(Error::ProfileNotFound(game_id.to_string()))
    }
}

impl ProfileSource for ProfileDirectory {
    fn load_profile(&self, game_id: &str) -> Option<ProfileConfig> {
        match self.load(game_id) {
            Ok(profile) => {
                info!("Loaded profile '{}' for {}", profile.id, game_id);
                Some(profile)
            }
            Err(e) => {
                warn!("No profile for {} in {}: {}", game_id, self.dir.display(), e);
                None
            }
        }
    }
}
