//! HTTP reindex trigger.
//!
//! Fires a single GET at the configured endpoint (by default the
//! autosuggest DataImportHandler `full-import` command). The body is
//! drained and discarded; only the status matters.

use std::time::Duration;

use metrics::counter;
use reqwest::Url;
use tracing::info;

use querytally_core::error::TriggerError;
use querytally_core::metrics::{LABEL_RESULT, REINDEX_TRIGGERS_TOTAL};
use querytally_core::pipeline::ReindexTrigger;

/// [`ReindexTrigger`] backed by a reqwest client.
pub struct HttpReindexTrigger {
    client: reqwest::Client,
}

impl HttpReindexTrigger {
    /// Build a trigger whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TriggerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriggerError::Transport {
                endpoint: "<client>".to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    async fn send(&self, endpoint: &str) -> Result<(), TriggerError> {
        let url = Url::parse(endpoint).map_err(|e| TriggerError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

        let transport = |e: reqwest::Error| TriggerError::Transport {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriggerError::Status {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
            });
        }
        response.bytes().await.map_err(transport)?;
        Ok(())
    }
}

impl ReindexTrigger for HttpReindexTrigger {
    async fn trigger(&self, endpoint: &str) -> Result<(), TriggerError> {
        let result = self.send(endpoint).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        counter!(REINDEX_TRIGGERS_TOTAL, LABEL_RESULT => outcome).increment(1);
        if result.is_ok() {
            info!(endpoint, "autosuggest reindex triggered");
        }
        result
    }
}
