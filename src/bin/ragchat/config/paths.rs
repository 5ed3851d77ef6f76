use std::path::PathBuf;

use super::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl ConfigPaths {
    pub fn resolve(
        config_override: Option<PathBuf>,
        data_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let config_file = match config_override {
            Some(path) => path,
            None => Self::default_config_file()?,
        };
        let data_dir = match data_override {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let logs_dir = data_dir.join("logs");
        Ok(Self {
            config_file,
            data_dir,
            logs_dir,
        })
    }

    pub fn default_config_file() -> Result<PathBuf, ConfigError> {
        Ok(default_config_dir()?.join("config.toml"))
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    pub fn knowledge_dir(&self) -> PathBuf {
        self.data_dir.join("knowledge")
    }
}

fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".config").join("ragchat"))
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".local").join("share").join("ragchat"))
}
