//! REST を使った Realtime Store 実装
//!
//! ## 責務
//!
//! - ホスト型リアルタイムデータベースの REST インターフェースへの読み書き
//!   (`GET` / `PUT` on `{base}/{path}.json`)
//! - `Accept: text/event-stream` によるパスの変更購読
//!
//! ## 設計ノート
//!
//! イベントストリームの `put` / `patch` は差分しか含まないため、イベントを
//! 受け取るたびにパス全体の値を取得し直して配信します。

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url, header::ACCEPT};
use serde_json::Value;
use tokio::sync::mpsc;

use hiroba_shared::time::{Clock, SystemClock};

use crate::domain::{RealtimeStore, StoreError, StorePath, ValueWatch};

use super::{push_id::PushIdGenerator, sse::SseDecoder};

/// Connection settings shared by requests and watch tasks
#[derive(Clone)]
struct Endpoint {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl Endpoint {
    /// `{base}/{path}.json`, each key percent-encoded as one path segment
    fn url(&self, path: &StorePath) -> Url {
        let mut url = self.base_url.clone();
        // `new` only accepts URLs that can be a base, so the segments are always available
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            match path.segments().split_last() {
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{}.json", last));
                }
                None => {
                    segments.push(".json");
                }
            }
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn fetch(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(unavailable)?;
        let response = check_status(response)?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        Ok((!value.is_null()).then_some(value))
    }
}

/// REST を使った RealtimeStore 実装
pub struct RestRealtimeStore {
    endpoint: Endpoint,
    push_ids: PushIdGenerator,
    clock: Arc<dyn Clock>,
}

impl RestRealtimeStore {
    /// 新しい RestRealtimeStore を作成
    ///
    /// # Arguments
    ///
    /// * `base_url` - Database URL, e.g. `https://example-default-rtdb.firebasedatabase.app`
    /// * `auth_token` - Optional token sent as the `auth` query parameter
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Result<Self, StoreError> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url).map_err(|e| {
            StoreError::Unavailable(format!("Invalid database URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "Invalid database URL '{}'",
                base_url
            )));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            endpoint: Endpoint {
                client,
                base_url,
                auth_token,
            },
            push_ids: PushIdGenerator::new(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Request URL for a path (without the auth query)
    pub fn url(&self, path: &StorePath) -> String {
        self.endpoint.url(path).to_string()
    }
}

#[async_trait]
impl RealtimeStore for RestRealtimeStore {
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        self.endpoint.fetch(path).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let response = self
            .endpoint
            .authorize(self.endpoint.client.put(self.endpoint.url(path)))
            .json(&value)
            .send()
            .await
            .map_err(unavailable)?;
        check_status(response)?;
        tracing::debug!("Wrote '{}'", path);
        Ok(())
    }

    fn push_key(&self, _path: &StorePath) -> String {
        self.push_ids.generate(self.clock.now_millis())
    }

    async fn watch(&self, path: &StorePath) -> Result<ValueWatch, StoreError> {
        let response = self
            .endpoint
            .authorize(self.endpoint.client.get(self.endpoint.url(path)))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(unavailable)?;
        let response = check_status(response)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(stream_events(
            response,
            self.endpoint.clone(),
            path.clone(),
            sender,
        ));
        tracing::debug!("Watching '{}'", path);

        Ok(receiver)
    }
}

/// Read the event stream until it ends or the receiver is dropped
async fn stream_events(
    response: Response,
    endpoint: Endpoint,
    path: StorePath,
    sender: mpsc::UnboundedSender<Option<Value>>,
) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            _ = sender.closed() => {
                tracing::debug!("Watch on '{}' cancelled", path);
                return;
            }
            chunk = body.next() => chunk,
        };

        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                tracing::warn!("Event stream for '{}' failed: {}", path, e);
                return;
            }
            None => {
                tracing::info!("Event stream for '{}' ended", path);
                return;
            }
        };

        for event in decoder.feed(&bytes) {
            match event.event.as_str() {
                "put" | "patch" => match endpoint.fetch(&path).await {
                    Ok(value) => {
                        if sender.send(value).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to refresh '{}': {}", path, e);
                        return;
                    }
                },
                "keep-alive" => {}
                "cancel" | "auth_revoked" => {
                    tracing::warn!("Watch on '{}' closed by server ({})", path, event.event);
                    return;
                }
                other => tracing::debug!("Ignoring event '{}' on '{}'", other, path),
            }
        }
    }
}

fn unavailable(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn check_status(response: Response) -> Result<Response, StoreError> {
    status_to_result(response.status())?;
    Ok(response)
}

fn status_to_result(status: StatusCode) -> Result<(), StoreError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(StoreError::Rejected(format!("HTTP {}", status)))
    } else {
        Err(StoreError::Unavailable(format!("HTTP {}", status)))
    }
}
