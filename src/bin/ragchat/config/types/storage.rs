use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides `~/.local/share/ragchat`.
    pub data_dir: Option<String>,
}
