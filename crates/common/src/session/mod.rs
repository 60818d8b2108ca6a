//! The store/retrieve facade
//!
//! Write: codec -> trytes -> chunker -> transport.
//! Read: transport -> chunker -> trytes -> codec.
//!
//! Each operation runs inside a single-use [`Session`] whose state can be
//! watched by the caller. A failed session stays failed; callers start a new
//! one, which is always safe because uploads use fresh secrets and addresses
//! and downloads are read-only.

use std::fmt;

use tokio::sync::watch;

use crate::channel::{Channel, ChannelError};
use crate::chunker::{self, ChunkError};
use crate::codec::{self, CodecError, CodecOptions, Payload};
use crate::crypto::Secret;
use crate::transport::{Transport, TransportError};
use crate::trytes::{self, TryteError};

mod handle;

pub use handle::{Handle, HandleError, BUNDLE_KEY, SEED_KEY, SIDEKEY_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Encoding,
    Chunking,
    Publishing,
    Fetching,
    Reassembling,
    Decoding,
    Done,
    Failed(String),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed(_))
    }

    fn can_advance_to(&self, next: &SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (current, Failed(_)) => !current.is_terminal(),
            (Idle, Encoding) | (Encoding, Chunking) | (Chunking, Publishing) | (Publishing, Done) => {
                true
            }
            (Idle, Fetching)
            | (Fetching, Reassembling)
            | (Reassembling, Decoding)
            | (Decoding, Done) => true,
            _ => false,
        }
    }

    /// Short status line for progress displays
    pub fn status(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Encoding => "Encrypting...",
            SessionState::Chunking => "Chunking...",
            SessionState::Publishing => "Saving...",
            SessionState::Fetching => "Fetching code...",
            SessionState::Reassembling => "Reassembling...",
            SessionState::Decoding => "Decrypting...",
            SessionState::Done => "Done",
            SessionState::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.status()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("unable to decrypt or parse payload: {0}")]
    CorruptPayload(String),
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("incomplete chunk set: {0}")]
    IncompleteChunkSet(String),
    #[error("invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
}

impl From<CodecError> for SessionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encoding(msg) => SessionError::Encoding(msg),
            CodecError::CorruptPayload(msg) => SessionError::CorruptPayload(msg),
        }
    }
}

impl From<ChunkError> for SessionError {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::Encoding(msg) => SessionError::Encoding(msg),
            ChunkError::CorruptFrame(msg) => SessionError::CorruptPayload(msg),
            ChunkError::IncompleteChunkSet(msg) => SessionError::IncompleteChunkSet(msg),
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Channel(e) => SessionError::Channel(e),
            TransportError::NotFound(address) => SessionError::NotFound(address.to_string()),
            TransportError::Chunk(e) => e.into(),
            TransportError::TooManyFragments(n) => {
                SessionError::Encoding(format!("too many fragments: {}", n))
            }
        }
    }
}

impl From<TryteError> for SessionError {
    fn from(err: TryteError) -> Self {
        SessionError::CorruptPayload(err.to_string())
    }
}

/// State of one store or retrieve operation
#[derive(Debug)]
pub struct Session {
    state: watch::Sender<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self { state }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state change of this session
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn advance(&self, next: SessionState) -> Result<(), SessionError> {
        let current = self.state();
        if !current.can_advance_to(&next) {
            return Err(SessionError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        tracing::debug!(from = %current, to = %next, "session transition");
        self.state.send_replace(next);
        Ok(())
    }

    fn fail(&self, err: &SessionError) {
        if !self.state().is_terminal() {
            self.state.send_replace(SessionState::Failed(err.to_string()));
        }
    }
}

/// Encrypted paste storage over a channel
#[derive(Debug, Clone)]
pub struct Paste<C: Channel> {
    transport: Transport<C>,
    codec: CodecOptions,
}

impl<C: Channel> Paste<C> {
    pub fn new(transport: Transport<C>, codec: CodecOptions) -> Self {
        Self { transport, codec }
    }

    /// Encrypt and publish `payload`, generating a secret if none is given
    pub async fn store(
        &self,
        payload: &Payload,
        secret: Option<Secret>,
    ) -> Result<Handle, SessionError> {
        self.store_in(&Session::new(), payload, secret).await
    }

    /// Fetch and decrypt the payload behind `handle`
    pub async fn retrieve(&self, handle: &Handle) -> Result<Payload, SessionError> {
        self.retrieve_in(&Session::new(), handle).await
    }

    /// [`Paste::store`] inside a caller-owned session
    pub async fn store_in(
        &self,
        session: &Session,
        payload: &Payload,
        secret: Option<Secret>,
    ) -> Result<Handle, SessionError> {
        session.advance(SessionState::Encoding)?;
        let result = self.run_store(session, payload, secret).await;
        match &result {
            Ok(handle) => {
                tracing::info!(identifier = %handle.identifier, "stored payload");
            }
            Err(err) => {
                tracing::warn!(error = %err, "store failed");
                session.fail(err);
            }
        }
        result
    }

    /// [`Paste::retrieve`] inside a caller-owned session
    pub async fn retrieve_in(
        &self,
        session: &Session,
        handle: &Handle,
    ) -> Result<Payload, SessionError> {
        session.advance(SessionState::Fetching)?;
        let result = self.run_retrieve(session, handle).await;
        match &result {
            Ok(_) => {
                tracing::info!(identifier = %handle.identifier, "retrieved payload");
            }
            Err(err) => {
                tracing::warn!(identifier = %handle.identifier, error = %err, "retrieve failed");
                session.fail(err);
            }
        }
        result
    }

    async fn run_store(
        &self,
        session: &Session,
        payload: &Payload,
        secret: Option<Secret>,
    ) -> Result<Handle, SessionError> {
        let secret = secret.unwrap_or_else(Secret::generate);
        let text = codec::encode(payload, &secret, &self.codec)?;

        session.advance(SessionState::Chunking)?;
        let symbols = trytes::encode(text.as_bytes());
        let fragments = chunker::split(&symbols, self.transport.fragment_capacity())?;

        session.advance(SessionState::Publishing)?;
        let upload = self
            .transport
            .upload(&fragments, &self.transport.config().tag)
            .await?;

        session.advance(SessionState::Done)?;
        Ok(Handle {
            identifier: upload.identifier,
            secret,
            channel_secret: upload.channel_secret,
        })
    }

    async fn run_retrieve(
        &self,
        session: &Session,
        handle: &Handle,
    ) -> Result<Payload, SessionError> {
        let fragments = self
            .transport
            .download(&handle.identifier, handle.channel_secret.as_ref())
            .await?;

        session.advance(SessionState::Reassembling)?;
        let symbols = chunker::join(&fragments)?;
        let bytes = trytes::decode(&symbols)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| SessionError::CorruptPayload(format!("utf-8: {}", e)))?;

        session.advance(SessionState::Decoding)?;
        let payload = codec::decode(&text, &handle.secret)?;

        session.advance(SessionState::Done)?;
        Ok(payload)
    }
}
