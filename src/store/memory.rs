use crate::error::Result;
use crate::store::backend::{Etag, StoreBackend};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process stand-in for the vendor store, used by the test suite and for
/// local runs without store credentials. Version counters play the role of
/// ETags so conditional writes behave like the real backend.
#[derive(Default)]
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    root: Map<String, JsonValue>,
    versions: HashMap<String, u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_path(root: &Map<String, JsonValue>, path: &str) -> Option<JsonValue> {
        let mut node = JsonValue::Object(root.clone());
        for segment in path.trim_matches('/').split('/') {
            node = node.get(segment)?.clone();
        }
        Some(node)
    }

    fn write_path(root: &mut Map<String, JsonValue>, path: &str, value: Option<JsonValue>) {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let mut node = root;
        for segment in &segments[..segments.len() - 1] {
            node = node
                .entry(segment.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()))
                .as_object_mut()
                .expect("intermediate store node is not an object");
        }
        let leaf = segments[segments.len() - 1];
        match value {
            Some(v) => {
                node.insert(leaf.to_string(), v);
            }
            None => {
                node.remove(leaf);
            }
        }
    }

    fn bump(versions: &mut HashMap<String, u64>, path: &str) {
        // A write invalidates the tag of the record itself and of every
        // ancestor path, matching the real store's subtree ETags.
        let trimmed = path.trim_matches('/');
        let mut prefix = String::new();
        for segment in trimmed.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            *versions.entry(prefix.clone()).or_insert(0) += 1;
        }
    }

    fn etag(versions: &HashMap<String, u64>, path: &str) -> Etag {
        format!("v{}", versions.get(path.trim_matches('/')).copied().unwrap_or(0))
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Option<JsonValue>> {
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok(Self::read_path(&inner.root, path))
    }

    async fn put(&self, path: &str, value: &JsonValue) -> Result<()> {
        let mut inner = self.inner.write().expect("memory store lock poisoned");
        Self::write_path(&mut inner.root, path, Some(value.clone()));
        Self::bump(&mut inner.versions, path);
        Ok(())
    }

    async fn patch(&self, path: &str, value: &JsonValue) -> Result<()> {
        let mut inner = self.inner.write().expect("memory store lock poisoned");
        let mut merged = match Self::read_path(&inner.root, path) {
            Some(JsonValue::Object(map)) => map,
            _ => Map::new(),
        };
        if let JsonValue::Object(updates) = value {
            for (k, v) in updates {
                merged.insert(k.clone(), v.clone());
            }
        }
        Self::write_path(&mut inner.root, path, Some(JsonValue::Object(merged)));
        Self::bump(&mut inner.versions, path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut inner = self.inner.write().expect("memory store lock poisoned");
        Self::write_path(&mut inner.root, path, None);
        Self::bump(&mut inner.versions, path);
        Ok(())
    }

    async fn get_versioned(&self, path: &str) -> Result<(Option<JsonValue>, Etag)> {
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok((
            Self::read_path(&inner.root, path),
            Self::etag(&inner.versions, path),
        ))
    }

    async fn put_if_match(&self, path: &str, etag: &Etag, value: &JsonValue) -> Result<bool> {
        let mut inner = self.inner.write().expect("memory store lock poisoned");
        if Self::etag(&inner.versions, path) != *etag {
            return Ok(false);
        }
        Self::write_path(&mut inner.root, path, Some(value.clone()));
        Self::bump(&mut inner.versions, path);
        Ok(true)
    }

    async fn change_feed(&self, _path: &str) -> Result<Option<BoxStream<'static, ()>>> {
        // All writers share this process; local writes already publish
        // snapshots through the hub.
        Ok(None)
    }
}
