use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::Args;
use tokio::io::AsyncReadExt;

use common::codec::{MetaData, Payload, FONT_SIZES, MODES, TAB_SIZES, THEMES};
use common::crypto::{Secret, SecretError};
use common::session::{Session, SessionError};
use common::transport::ChannelMode;
use tanglepaste::state::StateError;

use super::report_progress;

#[derive(Args, Debug, Clone)]
pub struct Store {
    /// Read the source from this file instead of stdin
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Editor theme, e.g. monokai
    #[arg(long, value_parser = PossibleValuesParser::new(THEMES.iter().copied()))]
    pub theme: Option<String>,

    /// Syntax mode, e.g. python
    #[arg(long, value_parser = PossibleValuesParser::new(MODES.iter().copied()))]
    pub mode: Option<String>,

    #[arg(long, value_parser = parse_font_size)]
    pub font_size: Option<u32>,

    #[arg(long, value_parser = parse_tab_size)]
    pub tab_size: Option<u32>,

    /// Encrypt with this password instead of a generated secret
    #[arg(long)]
    pub secret: Option<String>,

    /// Only readers holding the printed sidekey can fetch the paste
    #[arg(long)]
    pub restricted: bool,
}

fn parse_font_size(s: &str) -> Result<u32, String> {
    parse_catalogued(s, FONT_SIZES)
}

fn parse_tab_size(s: &str) -> Result<u32, String> {
    parse_catalogued(s, TAB_SIZES)
}

fn parse_catalogued(s: &str, catalog: &[u32]) -> Result<u32, String> {
    let value: u32 = s.parse().map_err(|e| format!("{}", e))?;
    if catalog.contains(&value) {
        Ok(value)
    } else {
        let allowed: Vec<String> = catalog.iter().map(u32::to_string).collect();
        Err(format!("expected one of {}", allowed.join(", ")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("failed to read source: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid secret: {0}")]
    Secret(#[from] SecretError),

    #[error("store failed: {0}")]
    Session(#[from] SessionError),

    #[error("store timed out after {0} seconds")]
    TimedOut(u64),
}

impl Store {
    fn meta_data(&self) -> MetaData {
        let defaults = MetaData::default();
        MetaData {
            theme: self.theme.clone().unwrap_or(defaults.theme),
            mode: self.mode.clone().unwrap_or(defaults.mode),
            font_size: self.font_size.unwrap_or(defaults.font_size),
            tab_size: self.tab_size.unwrap_or(defaults.tab_size),
        }
    }

    async fn read_source(&self) -> Result<String, std::io::Error> {
        match &self.file {
            Some(path) => tokio::fs::read_to_string(path).await,
            None => {
                let mut source = String::new();
                tokio::io::stdin().read_to_string(&mut source).await?;
                Ok(source)
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Store {
    type Error = StoreError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.load_state()?;

        let payload = Payload::text(self.read_source().await?, self.meta_data());
        let secret = self.secret.clone().map(Secret::new).transpose()?;

        let mode = if self.restricted {
            ChannelMode::Restricted
        } else {
            state.config.mode
        };
        let paste = state.paste(mode)?;

        let session = Session::new();
        let progress = report_progress(session.subscribe());
        let result = ctx
            .with_deadline(paste.store_in(&session, &payload, secret))
            .await;
        progress.abort();
        let handle = result.map_err(|_| StoreError::TimedOut(ctx.timeout.as_secs()))??;

        let mut lines = vec![
            format!("bundle:  {}", handle.identifier),
            format!("seed:    {}", handle.secret.as_str()),
        ];
        if let Some(channel_secret) = &handle.channel_secret {
            lines.push(format!("sidekey: {}", channel_secret.as_str()));
        }
        lines.push(format!(
            "url:     {}",
            handle.share_url(&state.config.share_base_url)
        ));

        Ok(lines.join("\n"))
    }
}
