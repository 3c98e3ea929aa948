use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fmt, fs};

use serde::{Deserialize, Serialize};
use url::Url;

use common::crypto::RequestSigner;

use crate::cloud::{CloudClient, Credentials, DEFAULT_BASE_URL};
use crate::mqtt::ConnectOptions;

pub const APP_NAME: &str = "meross";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of the optional config file
///
/// Every field can also be given on the command line or through the
/// environment, which take priority over the file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Secret mixed into every request signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_publish_timeout_secs() -> u64 {
    10
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AppConfig")
            .field("email", &self.email)
            .field("password", &redact(&self.password))
            .field("salt", &redact(&self.salt))
            .field("base_url", &self.base_url)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("publish_timeout_secs", &self.publish_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Config file path (custom or default `~/.meross/config.toml`)
    pub fn path(custom_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)).join(CONFIG_FILE_NAME))
    }

    /// Load the config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_toml = fs::read_to_string(path)?;
        Ok(toml::from_str(&config_toml)?)
    }

    /// Load the config file if present, defaults otherwise
    pub fn load_or_default(custom_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = custom_path.is_some();
        let path = match Self::path(custom_path) {
            Ok(path) => path,
            Err(ConfigError::NoHomeDirectory) => return Ok(Self::defaults()),
            Err(e) => return Err(e),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Self::defaults());
        }

        tracing::debug!(path = %path.display(), "loading config");
        Self::load(&path)
    }

    /// Write a template config file; refuses to overwrite
    pub fn init(custom_path: Option<PathBuf>, config: Option<AppConfig>) -> Result<PathBuf, ConfigError> {
        let path = Self::path(custom_path)?;
        if path.exists() {
            return Err(ConfigError::AlreadyInitialized(path));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = config.unwrap_or_else(Self::defaults);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&path, config_toml)?;
        Ok(path)
    }

    fn defaults() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            publish_timeout_secs: default_publish_timeout_secs(),
            ..Default::default()
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Clone, Default)]
pub struct Overrides {
    pub email: Option<String>,
    pub password: Option<String>,
    pub salt: Option<String>,
    pub base_url: Option<Url>,
}

/// Fully resolved settings for talking to the cloud and the broker
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub signer: RequestSigner,
    pub base_url: Url,
    pub connect: ConnectOptions,
}

impl Settings {
    /// Merge overrides over the config file; overrides win
    pub fn resolve(overrides: Overrides, file: AppConfig) -> Result<Self, ConfigError> {
        let email = overrides
            .email
            .or(file.email)
            .ok_or(ConfigError::Missing("email"))?;
        let password = overrides
            .password
            .or(file.password)
            .ok_or(ConfigError::Missing("password"))?;
        let salt = overrides
            .salt
            .or(file.salt)
            .ok_or(ConfigError::Missing("salt"))?;
        let base_url = match overrides.base_url.or(file.base_url) {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        Ok(Self {
            credentials: Credentials { email, password },
            signer: RequestSigner::new(salt),
            base_url,
            connect: ConnectOptions {
                connect_timeout: Duration::from_secs(file.connect_timeout_secs),
                publish_timeout: Duration::from_secs(file.publish_timeout_secs),
            },
        })
    }

    pub fn cloud_client(&self) -> Result<CloudClient, crate::cloud::ApiError> {
        CloudClient::new(&self.base_url, self.signer.clone(), self.credentials.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no home directory found")]
    NoHomeDirectory,
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("config file already exists: {}", .0.display())]
    AlreadyInitialized(PathBuf),
    #[error("missing {0}: pass it as a flag, an environment variable or in the config file")]
    Missing(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
