use std::sync::Arc;

use clap::Args;

use common::channel::FsChannel;
use tanglepaste::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override the provider port (default from config)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("serving needs a filesystem channel; this config publishes to a remote provider")]
    RemoteChannel,

    #[error("provider failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.load_state()?;
        let channel_dir = state.channel_dir().ok_or(ServeError::RemoteChannel)?;
        let port = self.port.unwrap_or(state.config.provider_port);

        tracing::info!(dir = ?channel_dir, port, "serving filesystem channel");
        tanglepaste::spawn_provider(port, Arc::new(FsChannel::new(channel_dir)))
            .await
            .map_err(|e| ServeError::Failed(format!("{:#}", e)))?;

        Ok("provider stopped".to_string())
    }
}
