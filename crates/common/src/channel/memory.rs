use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use rand::seq::SliceRandom;

use super::{AccessKey, Ack, Address, Channel, ChannelError, StoredUnit, Unit};

/// In-memory channel using a shared HashMap
///
/// Clones share the same storage. Can pad messages to a slot width and shuffle
/// delivery order to behave like a ledger that guarantees neither.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    inner: Arc<RwLock<MemoryChannelInner>>,
    pad_to: Option<usize>,
    shuffle: bool,
}

#[derive(Debug, Default)]
struct MemoryChannelInner {
    /// address -> units in publish order
    units: HashMap<Address, Vec<StoredUnit>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Right-pad every stored message to `width` symbols
    pub fn with_padding(mut self, width: usize) -> Self {
        self.pad_to = Some(width);
        self
    }

    /// Return fetched units in random order
    pub fn with_shuffled_delivery(mut self) -> Self {
        self.shuffle = true;
        self
    }

    /// Number of units stored under `address`, regardless of access scope
    pub fn len(&self, address: &Address) -> Result<usize, ChannelError> {
        let inner = self.inner.read().map_err(|e| {
            ChannelError::Internal(format!("failed to acquire read lock: {}", e))
        })?;
        Ok(inner.units.get(address).map(Vec::len).unwrap_or(0))
    }

    pub fn is_empty(&self, address: &Address) -> Result<bool, ChannelError> {
        Ok(self.len(address)? == 0)
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn publish(&self, unit: Unit, access: Option<&AccessKey>) -> Result<Ack, ChannelError> {
        unit.validate()?;
        let unit = match self.pad_to {
            Some(width) => unit.padded(width),
            None => unit,
        };
        let ack = Ack { hash: unit.hash() };

        let mut inner = self.inner.write().map_err(|e| {
            ChannelError::Internal(format!("failed to acquire write lock: {}", e))
        })?;
        inner
            .units
            .entry(unit.address.clone())
            .or_default()
            .push(StoredUnit {
                unit,
                access: access.cloned(),
            });

        Ok(ack)
    }

    async fn fetch(
        &self,
        address: &Address,
        access: Option<&AccessKey>,
    ) -> Result<Vec<Unit>, ChannelError> {
        let mut units: Vec<Unit> = {
            let inner = self.inner.read().map_err(|e| {
                ChannelError::Internal(format!("failed to acquire read lock: {}", e))
            })?;
            inner
                .units
                .get(address)
                .map(|stored| {
                    stored
                        .iter()
                        .filter(|s| s.visible_to(access))
                        .map(|s| s.unit.clone())
                        .collect()
                })
                .unwrap_or_default()
        };

        if self.shuffle {
            units.shuffle(&mut rand::rng());
        }

        Ok(units)
    }
}
