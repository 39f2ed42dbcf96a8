use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, watch};

const CHANNEL_CAPACITY: usize = 64;

/// Whole-collection snapshot pushed to every subscriber of that collection.
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    pub collection: String,
    pub data: JsonValue,
}

/// Fan-out point for store snapshots: one broadcast channel per logical
/// collection. Components register per collection and receive whole-snapshot
/// notifications; lagging subscribers lose intermediate snapshots, never the
/// latest one.
#[derive(Clone, Default)]
pub struct SnapshotHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<SnapshotEvent>>>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, collection: &str) -> broadcast::Sender<SnapshotEvent> {
        if let Some(tx) = self
            .channels
            .read()
            .expect("snapshot hub lock poisoned")
            .get(collection)
        {
            return tx.clone();
        }
        let mut guard = self.channels.write().expect("snapshot hub lock poisoned");
        guard
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    pub fn publish(&self, collection: &str, data: JsonValue) {
        let tx = self.sender(collection);
        // No receivers is fine; nobody is watching this collection yet.
        let _ = tx.send(SnapshotEvent {
            collection: collection.to_string(),
            data,
        });
    }

    pub fn subscribe(&self, collection: &str) -> Subscription {
        let rx = self.sender(collection).subscribe();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Subscription {
            receiver: rx,
            cancel_rx,
            cancel_tx: Arc::new(cancel_tx),
        }
    }
}

/// Cancels the subscription it was taken from; safe to trigger from another
/// task.
#[derive(Clone)]
pub struct SubscriptionHandle {
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl SubscriptionHandle {
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// One registered observer of a collection. `recv` resolves to `None` once
/// the subscription is cancelled or the hub goes away.
pub struct Subscription {
    receiver: broadcast::Receiver<SnapshotEvent>,
    cancel_rx: watch::Receiver<bool>,
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl Subscription {
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle {
            cancel_tx: self.cancel_tx.clone(),
        }
    }

    pub async fn recv(&mut self) -> Option<SnapshotEvent> {
        loop {
            if *self.cancel_rx.borrow() {
                return None;
            }
            tokio::select! {
                changed = self.cancel_rx.changed() => {
                    if changed.is_err() || *self.cancel_rx.borrow() {
                        return None;
                    }
                }
                event = self.receiver.recv() => {
                    match event {
                        Ok(ev) => return Some(ev),
                        // Lagged: skip to the most recent snapshot.
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        }
    }
}
