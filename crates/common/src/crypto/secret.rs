//! Session secrets
//!
//! Two independent secrets exist per upload:
//! - [`Secret`] keys the payload cipher and travels to the reader out-of-band
//! - [`ChannelSecret`] derives the channel address and scopes restricted retrieval
//!
//! They are always drawn from independent randomness.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::trytes;

/// Length of generated secrets, in channel symbols
pub const SECRET_LENGTH: usize = 81;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret must not be empty")]
    Empty,
    #[error("channel secret must be {expected} channel symbols, got {got:?}")]
    InvalidChannelSecret { expected: usize, got: String },
}

fn random_trytes(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| trytes::symbol(rng.random_range(0..trytes::RADIX)))
        .collect()
}

/// Password-like key material for the payload cipher
///
/// Generated secrets are 81 symbols of the channel alphabet, but any non-empty
/// string is accepted so a reader can type a short shared password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Secret(String);

impl Secret {
    /// Generate a fresh random secret using the thread-local CSPRNG
    pub fn generate() -> Self {
        Self(random_trytes(SECRET_LENGTH))
    }

    pub fn new(secret: impl Into<String>) -> Result<Self, SecretError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SecretError::Empty);
        }
        Ok(Self(secret))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// Never print key material into logs
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} symbols>)", self.0.chars().count())
    }
}

impl FromStr for Secret {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Secret {
    type Error = SecretError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Secret> for String {
    fn from(secret: Secret) -> Self {
        secret.0
    }
}

/// Key material for channel addressing and restricted retrieval
///
/// Always exactly [`SECRET_LENGTH`] channel symbols, like a ledger seed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelSecret(String);

impl ChannelSecret {
    pub fn generate() -> Self {
        Self(random_trytes(SECRET_LENGTH))
    }

    pub fn parse(s: &str) -> Result<Self, SecretError> {
        if s.chars().count() != SECRET_LENGTH || !trytes::is_trytes(s) {
            return Err(SecretError::InvalidChannelSecret {
                expected: SECRET_LENGTH,
                got: s.to_string(),
            });
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex BLAKE3 digest of the secret
    ///
    /// Channels store and compare this digest so providers never see the raw seed.
    pub fn access_digest(&self) -> String {
        blake3::hash(self.0.as_bytes()).to_hex().to_string()
    }
}

impl fmt::Debug for ChannelSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelSecret({}..)", &self.access_digest()[..8])
    }
}

impl FromStr for ChannelSecret {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChannelSecret {
    type Error = SecretError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChannelSecret> for String {
    fn from(secret: ChannelSecret) -> Self {
        secret.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_generated_secret_shape() {
        let secret = Secret::generate();
        assert_eq!(secret.as_str().len(), SECRET_LENGTH);
        assert!(trytes::is_trytes(secret.as_str()));
    }

    #[test]
    fn test_generated_secrets_differ() {
        assert_ne!(Secret::generate(), Secret::generate());
        assert_ne!(ChannelSecret::generate(), ChannelSecret::generate());
    }

    #[test]
    fn test_short_passwords_are_accepted() {
        let secret: Secret = "ABC123".parse().unwrap();
        assert_eq!(secret.as_str(), "ABC123");
        assert_eq!(Secret::new(""), Err(SecretError::Empty));
    }

    #[test]
    fn test_channel_secret_validation() {
        assert!(ChannelSecret::parse("ABC").is_err());
        assert!(ChannelSecret::parse(&"a".repeat(SECRET_LENGTH)).is_err());
        let secret = ChannelSecret::generate();
        assert_eq!(ChannelSecret::parse(secret.as_str()).unwrap(), secret);
    }

    #[test]
    fn test_debug_does_not_leak() {
        let secret = Secret::new("hunter2").unwrap();
        assert!(!format!("{:?}", secret).contains("hunter2"));

        let channel = ChannelSecret::generate();
        assert!(!format!("{:?}", channel).contains(channel.as_str()));
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let secret = ChannelSecret::generate();
        let json = serde_json::to_string(&secret).unwrap();
        let back: ChannelSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
        assert!(serde_json::from_str::<ChannelSecret>("\"nope\"").is_err());
    }
}
