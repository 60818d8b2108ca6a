use std::sync::Arc;
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use common::channel::{Channel, ChannelError, FsChannel, HttpChannel, ProofOfWork, Tag};
use common::codec::CodecOptions;
use common::crypto::{ChannelSecret, DEFAULT_ITERATIONS};
use common::session::Paste;
use common::transport::{ChannelMode, Transport, TransportConfig};

pub const APP_NAME: &str = "tanglepaste";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CHANNEL_DIR_NAME: &str = "channel";

/// Where units are published and fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelBackend {
    /// Local append-only files
    Filesystem {
        /// Defaults to `<paste dir>/channel`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// A remote provider speaking the `/api/v0` routes
    Http { endpoint: Url },
}

impl Default for ChannelBackend {
    fn default() -> Self {
        ChannelBackend::Filesystem { path: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Page that share links point at
    #[serde(default = "default_share_base_url")]
    pub share_base_url: Url,
    /// Listen port for `paste serve`
    #[serde(default = "default_provider_port")]
    pub provider_port: u16,
    /// PBKDF2 iterations used when storing
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default)]
    pub tag: Tag,
    #[serde(default)]
    pub mode: ChannelMode,
    /// Reused for every restricted store instead of a fresh one each time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted_secret: Option<ChannelSecret>,
    #[serde(default)]
    pub pow: ProofOfWork,
    #[serde(default)]
    pub channel: ChannelBackend,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_share_base_url() -> Url {
    Url::parse("https://tanglepaste.com/").expect("hardcoded URL must parse")
}

fn default_provider_port() -> u16 {
    5001
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            share_base_url: default_share_base_url(),
            provider_port: default_provider_port(),
            iterations: default_iterations(),
            tag: Tag::default(),
            mode: ChannelMode::default(),
            restricted_secret: None,
            pow: ProofOfWork::default(),
            channel: ChannelBackend::default(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the paste directory (~/.tanglepaste)
    pub paste_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the paste directory path (custom or default ~/.tanglepaste)
    pub fn paste_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new paste directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let paste_dir = Self::paste_dir(custom_path)?;
        let config_path = paste_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&paste_dir)?;

        let config = config.unwrap_or_default();
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        let state = Self {
            paste_dir,
            config_path,
            config,
        };
        if let Some(channel_dir) = state.channel_dir() {
            fs::create_dir_all(channel_dir)?;
        }

        Ok(state)
    }

    /// Load existing state from the paste directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let paste_dir = Self::paste_dir(custom_path)?;
        let config_path = paste_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            paste_dir,
            config_path,
            config,
        })
    }

    /// Directory of the filesystem channel, if that is the configured backend
    pub fn channel_dir(&self) -> Option<PathBuf> {
        match &self.config.channel {
            ChannelBackend::Filesystem { path } => Some(self.filesystem_dir(path.as_ref())),
            ChannelBackend::Http { .. } => None,
        }
    }

    fn filesystem_dir(&self, path: Option<&PathBuf>) -> PathBuf {
        path.cloned()
            .unwrap_or_else(|| self.paste_dir.join(CHANNEL_DIR_NAME))
    }

    /// The configured channel backend
    pub fn channel(&self) -> Result<Arc<dyn Channel>, StateError> {
        let channel: Arc<dyn Channel> = match &self.config.channel {
            ChannelBackend::Filesystem { path } => {
                Arc::new(FsChannel::new(self.filesystem_dir(path.as_ref())))
            }
            ChannelBackend::Http { endpoint } => {
                Arc::new(HttpChannel::new(endpoint, self.config.pow)?)
            }
        };
        Ok(channel)
    }

    pub fn transport_config(&self, mode: ChannelMode) -> TransportConfig {
        TransportConfig {
            tag: self.config.tag.clone(),
            mode,
            restricted_secret: self.config.restricted_secret.clone(),
            ..TransportConfig::default()
        }
    }

    /// A store/retrieve facade over the configured channel
    pub fn paste(&self, mode: ChannelMode) -> Result<Paste<Arc<dyn Channel>>, StateError> {
        let transport = Transport::new(self.channel()?, self.transport_config(mode));
        Ok(Paste::new(
            transport,
            CodecOptions {
                iterations: self.config.iterations,
            },
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("paste directory not initialized. Run 'paste init' first")]
    NotInitialized,

    #[error("paste directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("channel setup failed: {0}")]
    Channel(#[from] ChannelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
