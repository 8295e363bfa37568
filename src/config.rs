use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::string::String;
use url::Url;

use std::fmt;
use std::fs;

pub const TARGET_DIR_VAR: &str = "DB_TARGET_DIR";
pub const ACCESS_TOKEN_VAR: &str = "DB_ACCESS_TOKEN";
pub const CONF_FILE_VAR: &str = "CONF_FILE";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DropboxConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        DropboxConfig {
            endpoint: default_endpoint(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocalhostConfig {
    pub path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Remote prefix every uploaded path is placed under.
    pub target_dir: Option<String>,
    pub access_token: Option<String>,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    // remotes
    #[serde(default)]
    pub dropbox: DropboxConfig,
    pub localhost: Option<LocalhostConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_dir: None,
            access_token: None,
            log_file: default_log_file(),
            dropbox: DropboxConfig::default(),
            localhost: None,
        }
    }
}

fn default_endpoint() -> Url {
    // A constant, well-formed URL
    Url::parse("https://content.dropboxapi.com/2/").unwrap()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("log_file.log")
}

#[derive(Debug)]
pub enum Error {
    Open(std::io::Error),
    Parse(toml::de::Error),
}

impl std::error::Error for Error {}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Open(error) => write!(f, "Could not open/read config: {}", error),
            Error::Parse(error) => write!(f, "Failed to parse config: {}", error),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Open(error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Parse(error)
    }
}

impl Config {
    pub fn new(path: &Path) -> Result<Config, Error> {
        let txt = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&txt)?;
        Ok(config)
    }

    /// Reads `CONF_FILE` (when set) and overlays the process environment.
    pub fn from_env() -> Result<Config, Error> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], with the variables provided by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match lookup(CONF_FILE_VAR) {
            Some(path) => {
                let path = shellexpand::tilde(&path).to_string();
                Config::new(Path::new(&path))?
            }
            None => Config::default(),
        };
        Ok(config.overlay(lookup))
    }

    fn overlay<F>(mut self, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(target_dir) = lookup(TARGET_DIR_VAR) {
            self.target_dir = Some(target_dir);
        }
        if let Some(token) = lookup(ACCESS_TOKEN_VAR) {
            self.access_token = Some(token);
        }
        let log_file = shellexpand::tilde(&self.log_file.to_string_lossy()).to_string();
        self.log_file = PathBuf::from(log_file);
        self
    }
}
