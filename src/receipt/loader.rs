//! Fetching receipt snapshots from the donor API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use thiserror::Error;

use super::models::ReceiptSnapshot;
use crate::session::Session;

const RECEIPT_VIEW_PATH: &str = "fetch-donor-receipt-view";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("donor API rejected the session credentials")]
    Unauthorized,
    #[error("receipt {0} not found")]
    NotFound(String),
    #[error("donor API responded with status {0}")]
    Upstream(u16),
    #[error("failed to reach donor API: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to decode receipt payload: {0}")]
    Decode(String),
}

/// Upstream that can produce receipt snapshots.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn fetch_receipt(
        &self,
        session: &Session,
        receipt_id: &str,
    ) -> Result<ReceiptSnapshot, LoadError>;
}

pub struct HttpReceiptSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReceiptSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn receipt_url(&self) -> String {
        format!("{}/{}", self.base_url, RECEIPT_VIEW_PATH)
    }
}

#[async_trait]
impl ReceiptSource for HttpReceiptSource {
    async fn fetch_receipt(
        &self,
        session: &Session,
        receipt_id: &str,
    ) -> Result<ReceiptSnapshot, LoadError> {
        let response = self
            .client
            .get(self.receipt_url())
            .query(&[("id", receipt_id)])
            .header(reqwest::header::AUTHORIZATION, session.bearer_header())
            .send()
            .await
            .map_err(LoadError::Transport)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LoadError::Unauthorized)
            }
            StatusCode::NOT_FOUND => return Err(LoadError::NotFound(receipt_id.to_string())),
            status => return Err(LoadError::Upstream(status.as_u16())),
        }

        let body = response.bytes().await.map_err(LoadError::Transport)?;
        serde_json::from_slice(&body).map_err(|e| LoadError::Decode(e.to_string()))
    }
}

/// Outcome of a load request.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// No receipt id was supplied, so nothing was fetched.
    Disabled,
    Ready(Arc<ReceiptSnapshot>),
}

/// Cached front of a [`ReceiptSource`]. Entries go stale after the configured TTL.
#[derive(Clone)]
pub struct ReceiptLoader {
    source: Arc<dyn ReceiptSource>,
    cache: Cache<(String, String), Arc<ReceiptSnapshot>>,
}

impl ReceiptLoader {
    pub fn new(source: Arc<dyn ReceiptSource>, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();
        Self { source, cache }
    }

    pub async fn load(
        &self,
        session: &Session,
        receipt_id: Option<&str>,
    ) -> Result<LoadState, LoadError> {
        let receipt_id = match receipt_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => return Ok(LoadState::Disabled),
        };

        let key = (session.token().to_string(), receipt_id.to_string());
        if let Some(snapshot) = self.cache.get(&key).await {
            log::debug!("Receipt {} served from cache", receipt_id);
            return Ok(LoadState::Ready(snapshot));
        }

        let snapshot = Arc::new(self.source.fetch_receipt(session, receipt_id).await?);
        self.cache.insert(key, snapshot.clone()).await;
        log::debug!("Receipt {} fetched from donor API", receipt_id);

        Ok(LoadState::Ready(snapshot))
    }
}
