use serde::{Deserialize, Serialize};

use super::DEFAULT_TEMPERATURE;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Model used at startup; the first served model when unset.
    pub default_model: Option<String>,
    pub temperature: f32,
    /// `-1` lets the server decide.
    pub max_tokens: i32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: -1,
        }
    }
}
