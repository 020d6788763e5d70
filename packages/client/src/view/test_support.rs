//! Stores that stall or fail on purpose, for view tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use hiroba_core::domain::{RealtimeStore, StoreError, StorePath, ValueWatch};

/// Reads and watches fail after a delay, writes are refused at once
pub(crate) struct SlowFailingStore {
    read_delay: Duration,
}

impl SlowFailingStore {
    pub(crate) fn new(read_delay: Duration) -> Self {
        Self { read_delay }
    }
}

#[async_trait]
impl RealtimeStore for SlowFailingStore {
    async fn get(&self, _path: &StorePath) -> Result<Option<Value>, StoreError> {
        tokio::time::sleep(self.read_delay).await;
        Err(StoreError::Unavailable("connection reset".to_string()))
    }

    async fn set(&self, _path: &StorePath, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Rejected("permission denied".to_string()))
    }

    fn push_key(&self, _path: &StorePath) -> String {
        Uuid::new_v4().to_string()
    }

    async fn watch(&self, _path: &StorePath) -> Result<ValueWatch, StoreError> {
        tokio::time::sleep(self.read_delay).await;
        Err(StoreError::Unavailable("connection reset".to_string()))
    }
}

/// A host that accepts requests and never answers
pub(crate) struct HangingStore;

#[async_trait]
impl RealtimeStore for HangingStore {
    async fn get(&self, _path: &StorePath) -> Result<Option<Value>, StoreError> {
        std::future::pending().await
    }

    async fn set(&self, _path: &StorePath, _value: Value) -> Result<(), StoreError> {
        std::future::pending().await
    }

    fn push_key(&self, _path: &StorePath) -> String {
        Uuid::new_v4().to_string()
    }

    async fn watch(&self, _path: &StorePath) -> Result<ValueWatch, StoreError> {
        std::future::pending().await
    }
}
