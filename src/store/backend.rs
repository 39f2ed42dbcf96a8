use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Opaque version tag used for compare-and-swap writes.
pub type Etag = String;

/// The narrow contract this service needs from the vendor's realtime store:
/// flat keyed records under slash-separated paths, last-write-wins updates,
/// an ETag-guarded conditional write, and an optional push-based change feed.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<JsonValue>>;

    async fn put(&self, path: &str, value: &JsonValue) -> Result<()>;

    /// Shallow merge into the record at `path`.
    async fn patch(&self, path: &str, value: &JsonValue) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Read together with the current version tag.
    async fn get_versioned(&self, path: &str) -> Result<(Option<JsonValue>, Etag)>;

    /// Write only if the record still carries `etag`. `Ok(false)` means the
    /// precondition failed and nothing was written.
    async fn put_if_match(&self, path: &str, etag: &Etag, value: &JsonValue) -> Result<bool>;

    /// Long-lived change feed for the subtree at `path`: yields once per
    /// remote mutation. Backends without a push feed return `None`.
    async fn change_feed(&self, path: &str) -> Result<Option<BoxStream<'static, ()>>>;
}

/// REST client for the vendor store (`<base>/<path>.json`), including its
/// `text/event-stream` change feed and ETag conditional writes.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: String, auth_token: Option<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn url(&self, path: &str) -> String {
        let mut url = format!("{}/{}.json", self.base_url, path.trim_matches('/'));
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(token);
        }
        url
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        Err(Error::Persistence(format!("store error {}: {}", status, text)))
    }
}

#[async_trait]
impl StoreBackend for HttpBackend {
    async fn get(&self, path: &str) -> Result<Option<JsonValue>> {
        let res = Self::check(self.client.get(self.url(path)).send().await?).await?;
        let body: JsonValue = res.json().await?;
        Ok(if body.is_null() { None } else { Some(body) })
    }

    async fn put(&self, path: &str, value: &JsonValue) -> Result<()> {
        Self::check(self.client.put(self.url(path)).json(value).send().await?).await?;
        Ok(())
    }

    async fn patch(&self, path: &str, value: &JsonValue) -> Result<()> {
        Self::check(self.client.patch(self.url(path)).json(value).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        Self::check(self.client.delete(self.url(path)).send().await?).await?;
        Ok(())
    }

    async fn get_versioned(&self, path: &str) -> Result<(Option<JsonValue>, Etag)> {
        let res = Self::check(
            self.client
                .get(self.url(path))
                .header("X-Firebase-ETag", "true")
                .send()
                .await?,
        )
        .await?;
        let etag = res
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body: JsonValue = res.json().await?;
        Ok((if body.is_null() { None } else { Some(body) }, etag))
    }

    async fn put_if_match(&self, path: &str, etag: &Etag, value: &JsonValue) -> Result<bool> {
        let res = self
            .client
            .put(self.url(path))
            .header("if-match", etag)
            .json(value)
            .send()
            .await?;
        if res.status() == reqwest::StatusCode::PRECONDITION_FAILED {
            return Ok(false);
        }
        Self::check(res).await?;
        Ok(true)
    }

    async fn change_feed(&self, path: &str) -> Result<Option<BoxStream<'static, ()>>> {
        let res = self
            .client
            .get(self.url(path))
            .header("Accept", "text/event-stream")
            .timeout(Duration::from_secs(24 * 60 * 60))
            .send()
            .await?;
        let res = Self::check(res).await?;

        // Each SSE message is an "event:" line followed by a "data:" line.
        // Only data-bearing mutations matter; keep-alives are skipped.
        let stream = res
            .bytes_stream()
            .scan((String::new(), String::new()), |(buffer, event), chunk| {
                let mut changes = Vec::new();
                if let Ok(bytes) = chunk {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    while let Some(pos) = buffer.find('\n') {
                        let line = buffer[..pos].trim().to_string();
                        buffer.drain(..pos + 1);
                        if let Some(name) = line.strip_prefix("event:") {
                            *event = name.trim().to_string();
                        } else if line.starts_with("data:")
                            && (event == "put" || event == "patch")
                        {
                            changes.push(());
                        }
                    }
                }
                futures::future::ready(Some(futures::stream::iter(changes)))
            })
            .flatten()
            .boxed();

        Ok(Some(stream))
    }
}
