//! Integration tests for pastes persisted through the filesystem channel

mod common;

use ::common::channel::FsChannel;
use ::common::codec::{MetaData, Payload};
use ::common::session::Handle;
use ::common::transport::TransportConfig;
use tempfile::TempDir;

#[tokio::test]
async fn test_paste_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("channel");
    let payload = Payload::text(
        common::noisy_source(6_000),
        MetaData {
            theme: "monokai".to_string(),
            mode: "rust".to_string(),
            font_size: 18,
            tab_size: 2,
        },
    );

    let query = {
        let paste = common::paste_over(FsChannel::new(&root), TransportConfig::default());
        paste.store(&payload, None).await.unwrap().to_query()
    };

    let handle = Handle::from_query(&query).unwrap();
    let paste = common::paste_over(FsChannel::new(&root), TransportConfig::default());
    assert_eq!(paste.retrieve(&handle).await.unwrap(), payload);

    let file = root.join(format!("{}.jsonl", handle.identifier));
    let lines = std::fs::read_to_string(file).unwrap().lines().count();
    assert!(lines > 1);
}
