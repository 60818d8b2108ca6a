//! HTTP provider client and its wire types
//!
//! A provider exposes:
//! - `POST /api/v0/publish` with [`PublishRequest`] -> [`PublishResponse`]
//! - `POST /api/v0/fetch` with [`FetchRequest`] -> [`FetchResponse`]
//! - `GET /_status/livez`
//!
//! Proof-of-work parameters ride along with every publish; the provider owns
//! whatever attachment work its ledger needs.

use async_trait::async_trait;
use reqwest::{header::HeaderMap, header::HeaderValue, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{AccessKey, Ack, Address, Channel, ChannelError, Unit};

pub const PUBLISH_PATH: &str = "/api/v0/publish";
pub const FETCH_PATH: &str = "/api/v0/fetch";
pub const LIVEZ_PATH: &str = "/_status/livez";

/// Default tip-selection depth forwarded to providers
pub const DEFAULT_DEPTH: u32 = 4;
/// Default minimum weight magnitude forwarded to providers
pub const DEFAULT_MIN_WEIGHT_MAGNITUDE: u32 = 14;

/// Attachment parameters forwarded with every publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    pub depth: u32,
    pub min_weight_magnitude: u32,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            min_weight_magnitude: DEFAULT_MIN_WEIGHT_MAGNITUDE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessKey>,
    #[serde(flatten)]
    pub pow: ProofOfWork,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub ack: Ack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub units: Vec<Unit>,
}

/// A request the provider understands, and how to build it
pub trait ProviderRequest: Serialize {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ChannelError>;
}

impl ProviderRequest for PublishRequest {
    type Response = PublishResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ChannelError> {
        let full_url = base_url.join(PUBLISH_PATH)?;
        Ok(client.post(full_url).json(&self))
    }
}

impl ProviderRequest for FetchRequest {
    type Response = FetchResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ChannelError> {
        let full_url = base_url.join(FETCH_PATH)?;
        Ok(client.post(full_url).json(&self))
    }
}

/// Channel backed by a remote provider
#[derive(Debug, Clone)]
pub struct HttpChannel {
    endpoint: Url,
    pow: ProofOfWork,
    client: Client,
}

impl HttpChannel {
    pub fn new(endpoint: &Url, pow: ProofOfWork) -> Result<Self, ChannelError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            endpoint: endpoint.clone(),
            pow,
            client,
        })
    }

    pub async fn call<T: ProviderRequest>(&self, request: T) -> Result<T::Response, ChannelError> {
        let request_builder = request.build_request(&self.endpoint, &self.client)?;
        let response = request_builder.send().await?;

        if response.status().is_success() {
            response
                .json::<T::Response>()
                .await
                .map_err(|e| ChannelError::Malformed(e.to_string()))
        } else {
            Err(ChannelError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Check that the provider is up
    pub async fn livez(&self) -> Result<(), ChannelError> {
        let url = self.endpoint.join(LIVEZ_PATH)?;
        let response = self.client.get(url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }
}

#[async_trait]
impl Channel for HttpChannel {
    async fn publish(&self, unit: Unit, access: Option<&AccessKey>) -> Result<Ack, ChannelError> {
        unit.validate()?;
        let response = self
            .call(PublishRequest {
                unit,
                access: access.cloned(),
                pow: self.pow,
            })
            .await?;
        Ok(response.ack)
    }

    async fn fetch(
        &self,
        address: &Address,
        access: Option<&AccessKey>,
    ) -> Result<Vec<Unit>, ChannelError> {
        let response = self
            .call(FetchRequest {
                address: address.clone(),
                access: access.cloned(),
            })
            .await?;

        if let Some(stray) = response.units.iter().find(|u| u.address != *address) {
            return Err(ChannelError::Malformed(format!(
                "provider returned a unit for {} when asked for {}",
                stray.address, address
            )));
        }
        Ok(response.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{derive_address, Tag};
    use crate::crypto::ChannelSecret;

    #[test]
    fn test_publish_request_wire_shape() {
        let address = derive_address(&ChannelSecret::generate()).unwrap();
        let request = PublishRequest {
            unit: Unit {
                address: address.clone(),
                index: 0,
                total: 1,
                tag: Tag::default(),
                message: "AB".to_string(),
            },
            access: None,
            pow: ProofOfWork::default(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["depth"], 4);
        assert_eq!(json["min_weight_magnitude"], 14);
        assert_eq!(json["unit"]["address"], address.as_str());
        assert!(json.get("access").is_none());
    }

    #[test]
    fn test_request_urls() {
        let base = Url::parse("http://localhost:5001").unwrap();
        let client = Client::new();
        let address = derive_address(&ChannelSecret::generate()).unwrap();
        let request = FetchRequest {
            address,
            access: None,
        }
        .build_request(&base, &client)
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:5001/api/v0/fetch");
        assert_eq!(request.method(), reqwest::Method::POST);
    }
}
