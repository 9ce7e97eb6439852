use serde::{Deserialize, Serialize};

use crate::config::detection;

/// Where and how to probe for one emulator/console combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    pub id: String,
    pub name: String,
    /// Emulator process or package names; informational for the engine.
    #[serde(default, alias = "packageNames")]
    pub process_names: Vec<String>,
    /// Console tag such as `GCN` or `WII`.
    #[serde(rename = "console")]
    pub console_tag: String,
    pub port: u16,
    pub id_address: String,
    #[serde(default = "default_id_size")]
    pub id_size: usize,
}

fn default_id_size() -> usize {
    detection::DEFAULT_ID_SIZE
}

impl ConsoleConfig {
    /// Consoles used when no console list is available.
    pub fn builtin() -> Vec<Self> {
        let dolphin = vec![
            "org.dolphinemu.dolphinemu".to_string(),
            "org.dolphinemu.dolphinmmjr".to_string(),
        ];
        vec![
            Self {
                id: "dolphin_gcn".to_string(),
                name: "Dolphin (GameCube)".to_string(),
                process_names: dolphin.clone(),
                console_tag: "GCN".to_string(),
                port: 55355,
                id_address: "0x80000000".to_string(),
                id_size: detection::DEFAULT_ID_SIZE,
            },
            Self {
                id: "dolphin_wii".to_string(),
                name: "Dolphin (Wii)".to_string(),
                process_names: dolphin,
                console_tag: "WII".to_string(),
                port: 55356,
                id_address: "0x80000000".to_string(),
                id_size: detection::DEFAULT_ID_SIZE,
            },
        ]
    }
}
