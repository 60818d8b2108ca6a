//! Integration tests for the HTTP provider and its client channel

use std::net::SocketAddr;
use std::sync::Arc;

use common::channel::http::{FetchRequest, PublishRequest};
use common::channel::{
    derive_address, Channel, ChannelError, HttpChannel, MemoryChannel, ProofOfWork, Tag, Unit,
};
use common::codec::{CodecOptions, MetaData, Payload};
use common::crypto::ChannelSecret;
use common::session::{Handle, Paste, SessionError};
use common::transport::{ChannelMode, Transport, TransportConfig};
use tanglepaste::http_server::{self, ProviderState};
use tokio::net::TcpListener;
use tokio::sync::watch;
use url::Url;

struct TestProvider {
    addr: SocketAddr,
    backing: MemoryChannel,
    shutdown_tx: watch::Sender<()>,
    server: tokio::task::JoinHandle<Result<(), http_server::HttpServerError>>,
}

impl TestProvider {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backing = MemoryChannel::new()
            .with_padding(common::channel::MESSAGE_LENGTH)
            .with_shuffled_delivery();
        let state = ProviderState::new(Arc::new(backing.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let server = tokio::spawn(http_server::serve(
            listener,
            state,
            tracing::Level::DEBUG,
            shutdown_rx,
        ));

        Self {
            addr,
            backing,
            shutdown_tx,
            server,
        }
    }

    fn endpoint(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    fn client(&self) -> HttpChannel {
        HttpChannel::new(&self.endpoint(), ProofOfWork::default()).unwrap()
    }

    async fn stop(self) {
        self.shutdown_tx.send(()).unwrap();
        self.server.await.unwrap().unwrap();
    }
}

fn paste(channel: HttpChannel, mode: ChannelMode) -> Paste<HttpChannel> {
    let config = TransportConfig {
        mode,
        ..TransportConfig::default()
    };
    Paste::new(
        Transport::new(channel, config),
        CodecOptions { iterations: 10 },
    )
}

#[tokio::test]
async fn test_livez() {
    let provider = TestProvider::start().await;
    provider.client().livez().await.unwrap();
    provider.stop().await;
}

#[tokio::test]
async fn test_store_retrieve_over_http() {
    let provider = TestProvider::start().await;
    let paste = paste(provider.client(), ChannelMode::Public);
    let payload = Payload::text("SELECT 1;\n".repeat(500), MetaData::default());

    let handle = paste.store(&payload, None).await.unwrap();
    assert!(provider.backing.len(&handle.identifier).unwrap() >= 1);

    // a second client reading from the share URL
    let url = handle.share_url(&Url::parse("https://tanglepaste.com/").unwrap());
    let reader = self::paste(provider.client(), ChannelMode::Public);
    let retrieved = reader
        .retrieve(&Handle::from_url(&url).unwrap())
        .await
        .unwrap();
    assert_eq!(retrieved, payload);

    provider.stop().await;
}

#[tokio::test]
async fn test_restricted_over_http() {
    let provider = TestProvider::start().await;
    let paste = paste(provider.client(), ChannelMode::Restricted);
    let payload = Payload::text("secret plans", MetaData::default());

    let handle = paste.store(&payload, None).await.unwrap();
    let anonymous = Handle {
        channel_secret: None,
        ..handle.clone()
    };
    assert!(matches!(
        paste.retrieve(&anonymous).await,
        Err(SessionError::NotFound(_))
    ));
    assert_eq!(paste.retrieve(&handle).await.unwrap(), payload);

    provider.stop().await;
}

#[tokio::test]
async fn test_unknown_identifier_is_not_found() {
    let provider = TestProvider::start().await;
    let paste = paste(provider.client(), ChannelMode::Public);
    let handle = Handle {
        identifier: derive_address(&ChannelSecret::generate()).unwrap(),
        secret: common::crypto::Secret::generate(),
        channel_secret: None,
    };

    assert!(matches!(
        paste.retrieve(&handle).await,
        Err(SessionError::NotFound(_))
    ));
    provider.stop().await;
}

#[tokio::test]
async fn test_invalid_unit_is_bad_request() {
    let provider = TestProvider::start().await;
    let client = provider.client();
    let address = derive_address(&ChannelSecret::generate()).unwrap();

    // index outside the upload; bypass the client-side check
    let result = client
        .call(PublishRequest {
            unit: Unit {
                address: address.clone(),
                index: 3,
                total: 1,
                tag: Tag::default(),
                message: "AB".to_string(),
            },
            access: None,
            pow: ProofOfWork::default(),
        })
        .await;
    match result {
        Err(ChannelError::HttpStatus(status, _)) => assert_eq!(status.as_u16(), 400),
        other => panic!("expected a 400, got {:?}", other),
    }

    let fetched = client
        .call(FetchRequest {
            address,
            access: None,
        })
        .await
        .unwrap();
    assert!(fetched.units.is_empty());

    provider.stop().await;
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let provider = TestProvider::start().await;
    let url = provider.endpoint().join("/api/v0/nope").unwrap();

    let response = reqwest::Client::new().get(url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    provider.stop().await;
}

#[tokio::test]
async fn test_http_channel_behind_trait_object() {
    let provider = TestProvider::start().await;
    let channel: Arc<dyn Channel> = Arc::new(provider.client());
    let paste = Paste::new(
        Transport::new(channel, TransportConfig::default()),
        CodecOptions { iterations: 10 },
    );

    let payload = Payload::text("fn main() {}", MetaData::default());
    let handle = paste.store(&payload, None).await.unwrap();
    assert_eq!(paste.retrieve(&handle).await.unwrap(), payload);

    provider.stop().await;
}
