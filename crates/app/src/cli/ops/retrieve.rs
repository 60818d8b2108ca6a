use clap::Args;
use url::Url;

use common::channel::Address;
use common::crypto::{ChannelSecret, Secret};
use common::session::{Handle, HandleError, Session, SessionError, BUNDLE_KEY, SEED_KEY};
use tanglepaste::state::StateError;

use super::report_progress;

#[derive(Args, Debug, Clone)]
pub struct Retrieve {
    /// Identifier printed by `paste store`
    #[arg(long, required_unless_present = "url", requires = "seed")]
    pub bundle: Option<String>,

    /// Secret the paste was encrypted with
    #[arg(long)]
    pub seed: Option<String>,

    /// Channel secret of a restricted paste
    #[arg(long)]
    pub sidekey: Option<String>,

    /// Share URL carrying bundle, seed and sidekey
    #[arg(long, conflicts_with_all = ["bundle", "seed", "sidekey"])]
    pub url: Option<Url>,

    /// Print the whole payload, metadata included, as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("invalid handle: {0}")]
    Handle(#[from] HandleError),

    #[error("retrieve failed: {0}")]
    Session(#[from] SessionError),

    #[error("failed to render payload: {0}")]
    Render(#[from] serde_json::Error),

    #[error("retrieve timed out after {0} seconds")]
    TimedOut(u64),
}

impl Retrieve {
    fn handle(&self) -> Result<Handle, HandleError> {
        if let Some(url) = &self.url {
            return Handle::from_url(url);
        }

        let bundle = self
            .bundle
            .as_deref()
            .ok_or(HandleError::Missing(BUNDLE_KEY))?;
        let seed = self.seed.clone().ok_or(HandleError::Missing(SEED_KEY))?;

        Ok(Handle {
            identifier: Address::parse(bundle)?,
            secret: Secret::new(seed)?,
            channel_secret: self
                .sidekey
                .as_deref()
                .map(ChannelSecret::parse)
                .transpose()?,
        })
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Retrieve {
    type Error = RetrieveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let handle = self.handle()?;
        let state = ctx.load_state()?;
        let paste = state.paste(state.config.mode)?;

        let session = Session::new();
        let progress = report_progress(session.subscribe());
        let result = ctx.with_deadline(paste.retrieve_in(&session, &handle)).await;
        progress.abort();
        let payload = result.map_err(|_| RetrieveError::TimedOut(ctx.timeout.as_secs()))??;
        if !payload.meta_data.is_known() {
            tracing::warn!(meta_data = ?payload.meta_data, "paste carries rendering hints outside the catalog");
        }

        if self.json {
            return Ok(serde_json::to_string_pretty(&payload)?);
        }
        match payload.as_text() {
            Some(text) => Ok(text.to_string()),
            None => Ok(serde_json::to_string_pretty(&payload.data)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::channel::derive_address;

    fn retrieve() -> Retrieve {
        Retrieve {
            bundle: None,
            seed: None,
            sidekey: None,
            url: None,
            json: false,
        }
    }

    #[test]
    fn test_handle_from_flags() {
        let identifier = derive_address(&ChannelSecret::generate()).unwrap();
        let sidekey = ChannelSecret::generate();
        let handle = Retrieve {
            bundle: Some(identifier.to_string()),
            seed: Some("ABC123".to_string()),
            sidekey: Some(sidekey.as_str().to_string()),
            ..retrieve()
        }
        .handle()
        .unwrap();

        assert_eq!(handle.identifier, identifier);
        assert_eq!(handle.secret.as_str(), "ABC123");
        assert_eq!(handle.channel_secret, Some(sidekey));
    }

    #[test]
    fn test_handle_from_url() {
        let expected = Handle {
            identifier: derive_address(&ChannelSecret::generate()).unwrap(),
            secret: Secret::generate(),
            channel_secret: None,
        };
        let url = expected.share_url(&Url::parse("https://tanglepaste.com/").unwrap());

        let handle = Retrieve {
            url: Some(url),
            ..retrieve()
        }
        .handle()
        .unwrap();
        assert_eq!(handle, expected);
    }

    #[test]
    fn test_bad_bundle() {
        let result = Retrieve {
            bundle: Some("not-an-address".to_string()),
            seed: Some("x".to_string()),
            ..retrieve()
        }
        .handle();
        assert!(matches!(result, Err(HandleError::Identifier(_))));
    }
}
