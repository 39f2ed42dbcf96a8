use crate::error::{Error, Result};
use crate::store::backend::{Etag, StoreBackend};
use crate::store::subscription::{SnapshotHub, Subscription};
use futures::StreamExt;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Typed facade over the store backend. All payloads crossing this boundary
/// are (de)serialized strictly: a record that does not match its schema is
/// rejected here instead of flowing onward with undefined fields. Successful
/// writes re-publish the owning collection's snapshot through the hub.
#[derive(Clone)]
pub struct StoreClient {
    backend: Arc<dyn StoreBackend>,
    hub: SnapshotHub,
}

impl StoreClient {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            hub: SnapshotHub::new(),
        }
    }

    pub fn hub(&self) -> &SnapshotHub {
        &self.hub
    }

    /// Chronologically-sortable-enough record key in the style of the vendor
    /// SDK's push ids.
    pub fn push_id() -> String {
        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        format!("-{:x}{}", chrono::Utc::now().timestamp_millis(), suffix)
    }

    fn record_path(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, id)
    }

    fn decode<T: DeserializeOwned>(collection: &str, id: &str, value: JsonValue) -> Result<T> {
        serde_json::from_value(value).map_err(|e| {
            Error::Persistence(format!("malformed {} record {}: {}", collection, id, e))
        })
    }

    pub async fn get_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>> {
        match self.backend.get(&Self::record_path(collection, id)).await? {
            Some(value) => Ok(Some(Self::decode(collection, id, value)?)),
            None => Ok(None),
        }
    }

    /// Snapshot of a whole collection. Records that fail schema validation
    /// are rejected (logged and dropped) rather than handed to callers.
    pub async fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let Some(snapshot) = self.backend.get(collection).await? else {
            return Ok(Vec::new());
        };
        let JsonValue::Object(map) = snapshot else {
            return Err(Error::Persistence(format!(
                "collection {} is not a keyed map",
                collection
            )));
        };
        let mut records = Vec::with_capacity(map.len());
        for (id, value) in map {
            match Self::decode(collection, &id, value) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(collection, id = %id, error = %e, "rejecting malformed record"),
            }
        }
        Ok(records)
    }

    pub async fn put_record<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.backend
            .put(&Self::record_path(collection, id), &value)
            .await?;
        self.publish(collection).await;
        Ok(())
    }

    pub async fn patch_record(
        &self,
        collection: &str,
        id: &str,
        fields: &JsonValue,
    ) -> Result<()> {
        self.backend
            .patch(&Self::record_path(collection, id), fields)
            .await?;
        self.publish(collection).await;
        Ok(())
    }

    pub async fn get_versioned_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<(T, Etag)> {
        let (value, etag) = self
            .backend
            .get_versioned(&Self::record_path(collection, id))
            .await?;
        let value = value.ok_or_else(|| {
            Error::NotFound(format!("{} record {} not found", collection, id))
        })?;
        Ok((Self::decode(collection, id, value)?, etag))
    }

    /// Compare-and-swap write of one record. `Ok(false)` means someone else
    /// won the race and nothing was written.
    pub async fn put_record_if_match<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        etag: &Etag,
        record: &T,
    ) -> Result<bool> {
        let value = serde_json::to_value(record)?;
        let written = self
            .backend
            .put_if_match(&Self::record_path(collection, id), etag, &value)
            .await?;
        if written {
            self.publish(collection).await;
        }
        Ok(written)
    }

    /// Raw whole-collection snapshot, `Null` when the collection is empty.
    pub async fn snapshot(&self, collection: &str) -> Result<JsonValue> {
        Ok(self
            .backend
            .get(collection)
            .await?
            .unwrap_or(JsonValue::Null))
    }

    pub fn subscribe(&self, collection: &str) -> Subscription {
        self.hub.subscribe(collection)
    }

    async fn publish(&self, collection: &str) {
        match self.backend.get(collection).await {
            Ok(snapshot) => self
                .hub
                .publish(collection, snapshot.unwrap_or(JsonValue::Null)),
            Err(e) => tracing::warn!(collection, error = %e, "snapshot refresh failed"),
        }
    }

    /// Bridge the backend's push feed (writes made by other processes) into
    /// the hub. No-op for backends without one.
    pub fn spawn_change_feed(&self, collection: &'static str) {
        let client = self.clone();
        tokio::spawn(async move {
            loop {
                match client.backend.change_feed(collection).await {
                    Ok(None) => return,
                    Ok(Some(mut feed)) => {
                        while feed.next().await.is_some() {
                            client.publish(collection).await;
                        }
                        tracing::warn!(collection, "store change feed closed, reconnecting");
                    }
                    Err(e) => {
                        tracing::error!(collection, error = %e, "store change feed error");
                    }
                }
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            }
        });
    }
}
