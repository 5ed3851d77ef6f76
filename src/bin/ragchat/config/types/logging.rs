use serde::{Deserialize, Serialize};

use super::{DEFAULT_LOG_LEVEL, DEFAULT_LOG_ROTATE_KEEP, DEFAULT_LOG_ROTATE_SIZE};

/// `[logging]` section. Logs go to a file so they never interleave with the
/// streamed reply on the terminal.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level spec such as `info` or `ragchat=debug`; `RUST_LOG` wins.
    pub level: String,
    /// Log file; `<data_dir>/logs/ragchat.log` when unset.
    pub path: Option<String>,
    /// Bytes before the file is rotated.
    pub rotate_size: u64,
    /// Rotated files kept next to the live one.
    pub rotate_keep: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            path: None,
            rotate_size: DEFAULT_LOG_ROTATE_SIZE,
            rotate_keep: DEFAULT_LOG_ROTATE_KEEP,
        }
    }
}
