use serde::{Deserialize, Serialize};

use super::{DEFAULT_COLLECTION, DEFAULT_TOP_K};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub enabled: bool,
    pub top_k: usize,
    pub collection: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: DEFAULT_TOP_K,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}
