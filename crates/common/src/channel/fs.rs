use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{AccessKey, Ack, Address, Channel, ChannelError, StoredUnit, Unit, MESSAGE_LENGTH};

/// Filesystem-backed channel
///
/// Each address maps to `<root>/<address>.jsonl`; publishing appends one JSON
/// line and nothing is ever rewritten. Messages are padded to the full slot
/// width like a ledger would store them.
#[derive(Debug, Clone)]
pub struct FsChannel {
    root: PathBuf,
    pad_to: usize,
    write_lock: Arc<Mutex<()>>,
}

impl FsChannel {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pad_to: MESSAGE_LENGTH,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn path_for(&self, address: &Address) -> PathBuf {
        self.root.join(format!("{}.jsonl", address))
    }
}

#[async_trait]
impl Channel for FsChannel {
    async fn publish(&self, unit: Unit, access: Option<&AccessKey>) -> Result<Ack, ChannelError> {
        unit.validate()?;
        let unit = unit.padded(self.pad_to);
        let ack = Ack { hash: unit.hash() };
        let path = self.path_for(&unit.address);

        let mut line = serde_json::to_string(&StoredUnit {
            unit,
            access: access.cloned(),
        })
        .map_err(|e| ChannelError::Internal(format!("failed to serialize unit: {}", e)))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.root).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = ?path, hash = %ack.hash, "appended unit");
        Ok(ack)
    }

    async fn fetch(
        &self,
        address: &Address,
        access: Option<&AccessKey>,
    ) -> Result<Vec<Unit>, ChannelError> {
        let path = self.path_for(address);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut units = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let stored: StoredUnit = serde_json::from_str(line).map_err(|e| {
                ChannelError::Malformed(format!("{}:{}: {}", path.display(), number + 1, e))
            })?;
            if stored.unit.address != *address {
                return Err(ChannelError::Malformed(format!(
                    "{}:{}: unit filed under the wrong address",
                    path.display(),
                    number + 1
                )));
            }
            if stored.visible_to(access) {
                units.push(stored.unit);
            }
        }

        Ok(units)
    }
}
