//! Durable session store for suspended and in-flight orders

use crate::error::OrderError;
use crate::order::Order;
use std::path::Path;
use std::sync::Arc;

/// Sled-backed store keyed by `order_id`. Values are the CBOR encoding of the
/// order record. Survives process restarts; a suspended order is resumed from
/// what this store holds, nothing else.
#[derive(Clone)]
pub struct SessionStore {
    instance: Arc<sled::Db>,
}

impl SessionStore {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db = sled::open(path)?;
        Ok(Self::new(Arc::new(db)))
    }

    pub fn save(&self, order: &Order) -> anyhow::Result<()> {
        self.instance
            .insert(order.order_id.as_bytes(), order.to_bytes()?)?;
        self.instance.flush()?;
        Ok(())
    }

    pub fn load(&self, order_id: &str) -> anyhow::Result<Order> {
        let bytes = self
            .instance
            .get(order_id.as_bytes())?
            .ok_or_else(|| OrderError::UnknownOrder(order_id.to_string()))?;

        Order::from_bytes(bytes.as_ref())
    }

    /// Atomic read-modify-write of a single order record. Succeeds only if
    /// the stored bytes still equal `current`'s encoding, so two racing
    /// resume calls cannot both consume the same token. Returns false when
    /// the record moved on underneath us.
    pub fn swap(&self, current: &Order, updated: &Order) -> anyhow::Result<bool> {
        let outcome = self.instance.compare_and_swap(
            updated.order_id.as_bytes(),
            Some(current.to_bytes()?),
            Some(updated.to_bytes()?),
        )?;
        self.instance.flush()?;

        Ok(outcome.is_ok())
    }
}
