//! The channel capability
//!
//! A channel is an append-only, size-bounded message store keyed by address,
//! shaped after a ledger: every published [`Unit`] lands under an 81-symbol
//! [`Address`], carries a short [`Tag`] and at most [`MESSAGE_LENGTH`] channel
//! symbols, and comes back from [`Channel::fetch`] in no particular order.
//!
//! Implementations:
//! - [`MemoryChannel`]: in-process, for tests and embedding
//! - [`FsChannel`]: one append-only JSON-lines file per address
//! - [`HttpChannel`]: client for a remote provider speaking the `/api/v0` routes

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::ChannelSecret;
use crate::trytes;

mod fs;
pub mod http;
mod memory;

pub use fs::FsChannel;
pub use http::{HttpChannel, ProofOfWork};
pub use memory::MemoryChannel;

/// Width of a message slot, in channel symbols
pub const MESSAGE_LENGTH: usize = 2187;
/// Length of an address, in channel symbols
pub const ADDRESS_LENGTH: usize = 81;
/// Maximum length of a tag, in channel symbols
pub const TAG_LENGTH: usize = 27;
/// Tag attached to every unit unless configured otherwise
pub const DEFAULT_TAG: &str = "PASTETANGLE";

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(reqwest::StatusCode, String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed channel response: {0}")]
    Malformed(String),
    #[error("channel rejected unit: {0}")]
    Rejected(String),
    #[error("channel error: {0}")]
    Internal(String),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("address must be 81 channel symbols, got {0:?}")]
    Address(String),
    #[error("tag must be 1 to 27 channel symbols, got {0:?}")]
    Tag(String),
    #[error("access key must be 64 hex characters, got {0:?}")]
    AccessKey(String),
}

/// Write location shared by every unit of one upload; doubles as the retrieval identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.chars().count() != ADDRESS_LENGTH || !trytes::is_trytes(s) {
            return Err(ParseError::Address(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Short label attached to each unit so uploads can be told apart on the channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let len = s.chars().count();
        if len == 0 || len > TAG_LENGTH || !trytes::is_trytes(s) {
            return Err(ParseError::Tag(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self(DEFAULT_TAG.to_string())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

/// Restricted-retrieval token derived from a [`ChannelSecret`]
///
/// Providers store and compare this digest; the raw channel secret never leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessKey(String);

impl AccessKey {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match hex::decode(s) {
            Ok(bytes) if bytes.len() == blake3::OUT_LEN => {}
            _ => return Err(ParseError::AccessKey(s.to_string())),
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ChannelSecret> for AccessKey {
    fn from(secret: &ChannelSecret) -> Self {
        Self(secret.access_digest())
    }
}

impl TryFrom<String> for AccessKey {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccessKey> for String {
    fn from(key: AccessKey) -> Self {
        key.0
    }
}

/// One published message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub address: Address,
    /// Position of this unit within its upload
    pub index: u32,
    /// Number of units in the upload
    pub total: u32,
    pub tag: Tag,
    pub message: String,
}

impl Unit {
    /// Hex BLAKE3 digest over every field
    pub fn hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.address.as_str().as_bytes());
        hasher.update(&self.index.to_be_bytes());
        hasher.update(&self.total.to_be_bytes());
        hasher.update(self.tag.as_str().as_bytes());
        hasher.update(self.message.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Check the message fits one slot and uses only channel symbols
    pub fn validate(&self) -> Result<(), ChannelError> {
        let len = self.message.chars().count();
        if len > MESSAGE_LENGTH {
            return Err(ChannelError::Rejected(format!(
                "message of {} symbols exceeds slot width {}",
                len, MESSAGE_LENGTH
            )));
        }
        if !trytes::is_trytes(&self.message) {
            return Err(ChannelError::Rejected(
                "message contains symbols outside the channel alphabet".to_string(),
            ));
        }
        if self.index >= self.total {
            return Err(ChannelError::Rejected(format!(
                "index {} outside upload of {} units",
                self.index, self.total
            )));
        }
        Ok(())
    }

    /// Right-pad the message with the padding symbol up to `width`, the way a ledger fills its slots
    pub fn padded(mut self, width: usize) -> Self {
        let len = self.message.chars().count();
        if len < width {
            self.message
                .extend(std::iter::repeat(trytes::PADDING).take(width - len));
        }
        self
    }
}

/// Receipt for one published unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub hash: String,
}

/// A unit as kept by a channel, with its optional access scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUnit {
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessKey>,
}

impl StoredUnit {
    /// Public units are visible to everyone, restricted ones only with the matching key
    pub fn visible_to(&self, access: Option<&AccessKey>) -> bool {
        match &self.access {
            None => true,
            Some(required) => access == Some(required),
        }
    }
}

/// Derive a fresh address from a channel secret
///
/// Mixes the secret with 16 random bytes through the BLAKE3 XOF, so repeated
/// calls with the same secret still hand out distinct addresses.
pub fn derive_address(secret: &ChannelSecret) -> Result<Address, ChannelError> {
    let mut nonce = [0u8; 16];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| ChannelError::Internal(format!("failed to generate nonce: {}", e)))?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(b"tanglepaste/address/v1");
    hasher.update(secret.as_str().as_bytes());
    hasher.update(&nonce);

    let mut digest = [0u8; ADDRESS_LENGTH];
    hasher.finalize_xof().fill(&mut digest);
    Ok(Address(trytes::from_digest(&digest)))
}

#[async_trait]
pub trait Channel: Send + Sync + fmt::Debug {
    /// Allocate a fresh write location scoped to `secret`
    async fn new_address(&self, secret: &ChannelSecret) -> Result<Address, ChannelError> {
        derive_address(secret)
    }

    /// Append one unit; restricted units carry the access key needed to fetch them again
    async fn publish(&self, unit: Unit, access: Option<&AccessKey>) -> Result<Ack, ChannelError>;

    /// Every unit visible under `address`, in arbitrary order
    async fn fetch(
        &self,
        address: &Address,
        access: Option<&AccessKey>,
    ) -> Result<Vec<Unit>, ChannelError>;
}

#[async_trait]
impl<C: Channel + ?Sized> Channel for Arc<C> {
    async fn new_address(&self, secret: &ChannelSecret) -> Result<Address, ChannelError> {
        (**self).new_address(secret).await
    }

    async fn publish(&self, unit: Unit, access: Option<&AccessKey>) -> Result<Ack, ChannelError> {
        (**self).publish(unit, access).await
    }

    async fn fetch(
        &self,
        address: &Address,
        access: Option<&AccessKey>,
    ) -> Result<Vec<Unit>, ChannelError> {
        (**self).fetch(address, access).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unit(message: &str) -> Unit {
        Unit {
            address: derive_address(&ChannelSecret::generate()).unwrap(),
            index: 0,
            total: 1,
            tag: Tag::default(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_derived_addresses_are_fresh() {
        let secret = ChannelSecret::generate();
        let a = derive_address(&secret).unwrap();
        let b = derive_address(&secret).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), ADDRESS_LENGTH);
        assert!(Address::parse(a.as_str()).is_ok());
    }

    #[test]
    fn test_tag_validation() {
        assert_eq!(Tag::default().as_str(), "PASTETANGLE");
        assert!(Tag::parse("").is_err());
        assert!(Tag::parse("lower").is_err());
        assert!(Tag::parse(&"A".repeat(TAG_LENGTH + 1)).is_err());
        assert!(Tag::parse(&"A".repeat(TAG_LENGTH)).is_ok());
    }

    #[test]
    fn test_unit_validation() {
        assert!(unit("ABC").validate().is_ok());
        assert!(unit("abc").validate().is_err());
        assert!(unit(&"A".repeat(MESSAGE_LENGTH + 1)).validate().is_err());

        let mut out_of_range = unit("ABC");
        out_of_range.index = 1;
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_padding() {
        let padded = unit("ABC").padded(8);
        assert_eq!(padded.message, "ABC99999");
        assert!(padded.validate().is_ok());
        assert_eq!(unit("ABC").padded(2).message, "ABC");
    }

    #[test]
    fn test_hash_covers_position() {
        let a = unit("ABC");
        let mut b = a.clone();
        b.total = 2;
        b.index = 1;
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_visibility() {
        let secret = ChannelSecret::generate();
        let key = AccessKey::from(&secret);
        let other = AccessKey::from(&ChannelSecret::generate());

        let public = StoredUnit {
            unit: unit("A"),
            access: None,
        };
        assert!(public.visible_to(None));
        assert!(public.visible_to(Some(&key)));

        let restricted = StoredUnit {
            unit: unit("A"),
            access: Some(key.clone()),
        };
        assert!(!restricted.visible_to(None));
        assert!(!restricted.visible_to(Some(&other)));
        assert!(restricted.visible_to(Some(&key)));
    }

    #[test]
    fn test_access_key_parse() {
        let key = AccessKey::from(&ChannelSecret::generate());
        assert_eq!(AccessKey::parse(key.as_str()).unwrap(), key);
        assert!(AccessKey::parse("xyz").is_err());
    }
}
