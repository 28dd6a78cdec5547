//! HTTP client for the remote screening sheet.
//!
//! One endpoint serves both directions: `GET` returns every row, `POST`
//! applies a partial update to one row. Both calls carry the shared secret
//! as a `token` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use minerva_core::{Filter, RowUpdate, Snapshot};
use minerva_store::{RowSource, StoreError};
use thiserror::Error;
use tracing::{info, warn};

use crate::wire::{FetchEnvelope, SaveEnvelope, SaveRequest, records_from_rows};

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Remote(String),
}

impl From<SyncError> for StoreError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Remote(message) => StoreError::Remote(message),
            other => StoreError::Remote(other.to_string()),
        }
    }
}

/// Read/write client for the sheet endpoint.
pub struct RowStoreClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl RowStoreClient {
    /// Create a client for `endpoint` (the full web-app URL, no query string).
    pub fn new(endpoint: String, token: String, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every row, then filter and sort client-side.
    pub async fn fetch(&self, filter: Filter) -> Result<Snapshot, SyncError> {
        info!(endpoint = %self.endpoint, ?filter, "fetching sheet");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("token", &self.token)])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: FetchEnvelope = serde_json::from_str(&body)?;
        if !envelope.ok {
            return Err(SyncError::Remote(
                envelope
                    .error
                    .unwrap_or_else(|| "failed to load sheet".to_string()),
            ));
        }

        let snapshot = Snapshot::from_records(records_from_rows(&envelope.rows), filter);
        info!(
            fetched = envelope.rows.len(),
            rows = snapshot.len(),
            "fetched sheet"
        );
        Ok(snapshot)
    }

    /// Write `update` to row `row_id`.
    ///
    /// Returns `true` only when the server answers `ok: true`. Network errors,
    /// timeouts, bad status codes and malformed replies are logged and
    /// reported as `false`; the caller keeps its edits and may retry.
    pub async fn save(&self, row_id: i64, update: &RowUpdate) -> bool {
        match self.try_save(row_id, update).await {
            Ok(()) => {
                info!(row_id, fields = update.len(), "saved row");
                true
            }
            Err(e) => {
                warn!(row_id, error = %e, "save failed");
                false
            }
        }
    }

    async fn try_save(&self, row_id: i64, update: &RowUpdate) -> Result<(), SyncError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("token", &self.token)])
            .json(&SaveRequest {
                row: row_id,
                fields: update,
            })
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: SaveEnvelope = serde_json::from_str(&body)?;
        if envelope.ok {
            Ok(())
        } else {
            Err(SyncError::Remote(
                envelope.error.unwrap_or_else(|| "save rejected".to_string()),
            ))
        }
    }
}

#[async_trait]
impl RowSource for RowStoreClient {
    async fn fetch(&self, filter: Filter) -> Result<Snapshot, StoreError> {
        Ok(RowStoreClient::fetch(self, filter).await?)
    }

    async fn save(&self, row_id: i64, update: &RowUpdate) -> bool {
        RowStoreClient::save(self, row_id, update).await
    }
}
