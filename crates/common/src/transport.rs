//! Publishing fragments to a channel and collecting them again.
//!
//! Every fragment is framed with its exact length and published as its own
//! [`Unit`] carrying an explicit index and the upload's total, all under one
//! freshly derived address. On the way back units are unframed (which drops
//! any channel padding) and ordered by index; arrival order is irrelevant.

use serde::{Deserialize, Serialize};

use crate::channel::{
    AccessKey, Ack, Address, Channel, ChannelError, Tag, Unit, MESSAGE_LENGTH,
};
use crate::chunker::{self, ChunkError, Fragment, FRAME_HEADER_LEN};
use crate::crypto::ChannelSecret;

/// Who may fetch an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// Anyone holding the address can fetch the units
    #[default]
    Public,
    /// Units are scoped to the channel secret, which the handle must carry
    Restricted,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Tag attached to every unit
    pub tag: Tag,
    pub mode: ChannelMode,
    /// Fixed channel secret for restricted uploads; a fresh one is generated per upload if unset
    pub restricted_secret: Option<ChannelSecret>,
    /// Slot width of the channel, in symbols
    pub message_length: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tag: Tag::default(),
            mode: ChannelMode::Public,
            restricted_secret: None,
            message_length: MESSAGE_LENGTH,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("no fragments found under {0}")]
    NotFound(Address),
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    #[error("upload of {0} fragments exceeds what a unit index can address")]
    TooManyFragments(usize),
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub identifier: Address,
    /// Needed again for retrieval only in restricted mode
    pub channel_secret: Option<ChannelSecret>,
    pub acks: Vec<Ack>,
}

#[derive(Debug, Clone)]
pub struct Transport<C: Channel> {
    channel: C,
    config: TransportConfig,
}

impl<C: Channel> Transport<C> {
    pub fn new(channel: C, config: TransportConfig) -> Self {
        Self { channel, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Largest fragment body that fits one unit once framed
    pub fn fragment_capacity(&self) -> usize {
        self.config.message_length.saturating_sub(FRAME_HEADER_LEN)
    }

    /// Publish `fragments` in order under a fresh address
    pub async fn upload(&self, fragments: &[String], tag: &Tag) -> Result<Upload, TransportError> {
        if fragments.is_empty() {
            return Err(ChunkError::Encoding("nothing to upload".to_string()).into());
        }
        let width = self.config.message_length;
        if width <= FRAME_HEADER_LEN || width > MESSAGE_LENGTH {
            return Err(ChunkError::Encoding(format!(
                "slot width {} must be between {} and {}",
                width,
                FRAME_HEADER_LEN + 1,
                MESSAGE_LENGTH
            ))
            .into());
        }
        let total = u32::try_from(fragments.len())
            .map_err(|_| TransportError::TooManyFragments(fragments.len()))?;

        let restricted = self.config.mode == ChannelMode::Restricted;
        let secret = self
            .config
            .restricted_secret
            .clone()
            .filter(|_| restricted)
            .unwrap_or_else(ChannelSecret::generate);
        let access = restricted.then(|| AccessKey::from(&secret));

        let address = self.channel.new_address(&secret).await?;
        tracing::debug!(address = %address, fragments = total, restricted, "publishing upload");

        let mut acks = Vec::with_capacity(fragments.len());
        for (index, body) in (0u32..).zip(fragments) {
            let message = chunker::frame(body)?;
            if message.chars().count() > self.config.message_length {
                return Err(ChunkError::Encoding(format!(
                    "fragment {} does not fit a {} symbol slot",
                    index, self.config.message_length
                ))
                .into());
            }

            let unit = Unit {
                address: address.clone(),
                index,
                total,
                tag: tag.clone(),
                message,
            };
            let ack = self.channel.publish(unit, access.as_ref()).await?;
            tracing::debug!(address = %address, index, hash = %ack.hash, "published fragment");
            acks.push(ack);
        }

        tracing::info!(address = %address, fragments = total, "upload published");
        Ok(Upload {
            identifier: address,
            channel_secret: restricted.then_some(secret),
            acks,
        })
    }

    /// Fetch every fragment under `identifier` and return the bodies in index order
    ///
    /// Read-only; calling it again yields the same fragments.
    pub async fn download(
        &self,
        identifier: &Address,
        channel_secret: Option<&ChannelSecret>,
    ) -> Result<Vec<String>, TransportError> {
        let access = channel_secret.map(AccessKey::from);
        let units = self.channel.fetch(identifier, access.as_ref()).await?;
        if units.is_empty() {
            return Err(TransportError::NotFound(identifier.clone()));
        }
        tracing::debug!(address = %identifier, units = units.len(), "fetched units");

        let fragments = units
            .into_iter()
            .map(|unit| {
                Ok(Fragment {
                    index: unit.index,
                    total: unit.total,
                    body: chunker::unframe(&unit.message)?,
                })
            })
            .collect::<Result<Vec<_>, ChunkError>>()?;

        Ok(chunker::order(fragments)?)
    }
}
