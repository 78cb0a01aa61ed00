use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_VAR: &str = "BOT_TOKEN";

/// Environment variable that points at an alternative TOML config file.
pub const CONFIG_PATH_VAR: &str = "NUMINFO_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN environment variable is not set")]
    MissingToken,

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LookupConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: default_api_key(),
        }
    }
}

/// On-disk layout of the optional config file. The token never lives here.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    lookup: LookupConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub lookup: LookupConfig,
}

fn default_api_url() -> String {
    "https://numtoinfobyekam.ct.ws/api/num.php".to_string()
}

fn default_api_key() -> String {
    "KNOXRAHUL".to_string()
}

impl Config {
    /// Load configuration from the process environment and the optional config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Load configuration using `var` to look up environment variables.
    ///
    /// The token is checked before any file is touched, so a missing token
    /// always fails first.
    pub fn from_source<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = var(BOT_TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let lookup = match var(CONFIG_PATH_VAR) {
            // An explicitly named file must exist
            Some(path) => Self::read_file(Path::new(&path))?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::read_file(path)?
                } else {
                    LookupConfig::default()
                }
            }
        };

        Ok(Self { bot_token, lookup })
    }

    fn read_file(path: &Path) -> Result<LookupConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(content: &str) -> Result<LookupConfig, toml::de::Error> {
        let file: FileConfig = toml::from_str(content)?;
        Ok(file.lookup)
    }
}
