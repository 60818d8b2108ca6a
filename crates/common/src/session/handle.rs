use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use url::Url;

use crate::channel::{Address, ParseError};
use crate::crypto::{ChannelSecret, Secret, SecretError};

pub const BUNDLE_KEY: &str = "bundle";
pub const SEED_KEY: &str = "seed";
pub const SIDEKEY_KEY: &str = "sidekey";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("missing query parameter `{0}`")]
    Missing(&'static str),
    #[error("invalid identifier: {0}")]
    Identifier(#[from] ParseError),
    #[error("invalid secret: {0}")]
    Secret(#[from] SecretError),
}

/// Everything a reader needs to retrieve and decrypt one upload
///
/// The identifier alone locates the ciphertext but cannot decrypt it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub identifier: Address,
    pub secret: Secret,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_secret: Option<ChannelSecret>,
}

impl Handle {
    /// `bundle=<identifier>&seed=<secret>[&sidekey=<channel secret>]`
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair(BUNDLE_KEY, self.identifier.as_str());
        query.append_pair(SEED_KEY, self.secret.as_str());
        if let Some(channel_secret) = &self.channel_secret {
            query.append_pair(SIDEKEY_KEY, channel_secret.as_str());
        }
        query.finish()
    }

    pub fn from_query(query: &str) -> Result<Self, HandleError> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut identifier = None;
        let mut secret = None;
        let mut channel_secret = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                BUNDLE_KEY => identifier = Some(value.into_owned()),
                SEED_KEY => secret = Some(value.into_owned()),
                SIDEKEY_KEY => channel_secret = Some(value.into_owned()),
                _ => {}
            }
        }

        let identifier = Address::parse(&identifier.ok_or(HandleError::Missing(BUNDLE_KEY))?)?;
        let secret = Secret::new(secret.ok_or(HandleError::Missing(SEED_KEY))?)?;
        let channel_secret = channel_secret
            .map(|s| ChannelSecret::parse(&s))
            .transpose()?;

        Ok(Self {
            identifier,
            secret,
            channel_secret,
        })
    }

    /// `base` with this handle as its query string
    pub fn share_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(Some(&self.to_query()));
        url
    }

    pub fn from_url(url: &Url) -> Result<Self, HandleError> {
        Self::from_query(url.query().unwrap_or_default())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::channel::derive_address;

    fn handle(restricted: bool) -> Handle {
        Handle {
            identifier: derive_address(&ChannelSecret::generate()).unwrap(),
            secret: Secret::generate(),
            channel_secret: restricted.then(ChannelSecret::generate),
        }
    }

    #[test]
    fn test_query_roundtrip() {
        for restricted in [false, true] {
            let handle = handle(restricted);
            let query = handle.to_query();
            assert_eq!(query.contains("sidekey="), restricted);
            assert_eq!(Handle::from_query(&query).unwrap(), handle);
            assert_eq!(Handle::from_query(&format!("?{}", query)).unwrap(), handle);
        }
    }

    #[test]
    fn test_passwords_are_escaped() {
        let handle = Handle {
            secret: Secret::new("a b&c=d").unwrap(),
            ..handle(false)
        };
        let query = handle.to_query();
        assert!(!query.contains("a b&c"));
        assert_eq!(Handle::from_query(&query).unwrap(), handle);
    }

    #[test]
    fn test_share_url() {
        let handle = handle(false);
        let base = Url::parse("https://paste.example.com/?old=1").unwrap();
        let url = handle.share_url(&base);
        assert_eq!(url.host_str(), Some("paste.example.com"));
        assert!(!url.as_str().contains("old=1"));
        assert_eq!(Handle::from_url(&url).unwrap(), handle);
    }

    #[test]
    fn test_missing_parts() {
        let handle = handle(false);
        let only_bundle = format!("bundle={}", handle.identifier);
        assert_eq!(
            Handle::from_query(&only_bundle),
            Err(HandleError::Missing(SEED_KEY))
        );
        assert_eq!(
            Handle::from_query("seed=ABC"),
            Err(HandleError::Missing(BUNDLE_KEY))
        );
        assert!(matches!(
            Handle::from_query("bundle=SHORT&seed=ABC"),
            Err(HandleError::Identifier(_))
        ));
        let bad_sidekey = format!("{}&sidekey=nope", handle.to_query());
        assert!(matches!(
            Handle::from_query(&bad_sidekey),
            Err(HandleError::Secret(_))
        ));
    }
}
