use serde::{Deserialize, Serialize};

use super::{ChatConfig, LoggingConfig, RetrievalConfig, ServerConfig, StorageConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}
