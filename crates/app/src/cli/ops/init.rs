use std::path::PathBuf;

use clap::Args;
use url::Url;

use common::transport::ChannelMode;
use tanglepaste::state::{AppConfig, AppState, ChannelBackend, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Publish through a remote provider instead of a local channel directory
    #[arg(long, conflicts_with = "channel_dir")]
    pub provider: Option<Url>,

    /// Local channel directory (default: <config dir>/channel)
    #[arg(long)]
    pub channel_dir: Option<PathBuf>,

    /// Listen port for `paste serve`
    #[arg(long, default_value_t = 5001)]
    pub provider_port: u16,

    /// Page that share links point at
    #[arg(long)]
    pub share_base_url: Option<Url>,

    /// Store restricted pastes by default
    #[arg(long)]
    pub restricted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

impl Init {
    fn config(&self) -> AppConfig {
        let channel = match &self.provider {
            Some(endpoint) => ChannelBackend::Http {
                endpoint: endpoint.clone(),
            },
            None => ChannelBackend::Filesystem {
                path: self.channel_dir.clone(),
            },
        };
        let defaults = AppConfig::default();

        AppConfig {
            provider_port: self.provider_port,
            share_base_url: self
                .share_base_url
                .clone()
                .unwrap_or(defaults.share_base_url.clone()),
            mode: if self.restricted {
                ChannelMode::Restricted
            } else {
                ChannelMode::Public
            },
            channel,
            ..defaults
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::init(ctx.config_path.clone(), Some(self.config()))?;

        let channel = match (&state.config.channel, state.channel_dir()) {
            (ChannelBackend::Http { endpoint }, _) => format!("provider {}", endpoint),
            (_, Some(dir)) => format!("directory {}", dir.display()),
            (_, None) => "none".to_string(),
        };

        let output = format!(
            "Initialized paste directory at: {}\n\
             - Config: {}\n\
             - Channel: {}\n\
             - Mode: {:?}\n\
             - Share URL: {}\n\
             - Provider port: {}",
            state.paste_dir.display(),
            state.config_path.display(),
            channel,
            state.config.mode,
            state.config.share_base_url,
            state.config.provider_port,
        );

        Ok(output)
    }
}
