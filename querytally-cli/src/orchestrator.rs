//! Run orchestration -- ingest, reconcile, reindex.
//!
//! The [`Orchestrator`] sequences the three stages of one run and stops
//! at the first failure:
//!
//! 1. Ingest: read the log, extract queries, probe the search backend.
//!    Any failure here leaves the store untouched.
//! 2. Reconcile: open the tally store, then apply every observation in
//!    order. A store failure keeps earlier mutations and skips the reindex.
//! 3. Reindex: one call to the configured endpoint, if enabled.

use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

use querytally_core::error::{QueryTallyError, StoreError};
use querytally_core::pipeline::{ReindexTrigger, ResultProbe, TallyStore};
use querytally_core::types::QueryObservation;
use querytally_ingest::{IngestSummary, Ingestion, LogIngester};
use querytally_tally::{ReconcileSummary, TallyReconciler};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Log source that was read.
    pub source: String,
    pub ingest: IngestSummary,
    pub reconcile: ReconcileSummary,
    /// Whether the reindex endpoint was called successfully.
    pub reindex_triggered: bool,
}

/// Outcome of an ingest-only run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunReport {
    pub source: String,
    pub ingest: IngestSummary,
    pub observations: Vec<QueryObservation>,
}

/// Sequences one run over the given collaborators.
///
/// The tally store is opened through a caller-supplied function only once
/// ingestion has succeeded, so a failed ingest never creates a store.
pub struct Orchestrator<P, T> {
    ingester: LogIngester<P>,
    trigger: T,
    /// `None` disables the reindex stage.
    reindex_endpoint: Option<String>,
}

impl<P, T> Orchestrator<P, T>
where
    P: ResultProbe,
    T: ReindexTrigger,
{
    pub fn new(ingester: LogIngester<P>, trigger: T, reindex_endpoint: Option<String>) -> Self {
        Self {
            ingester,
            trigger,
            reindex_endpoint,
        }
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Run all stages against a log file.
    pub async fn run<S, F>(&self, log_path: &Path, open_store: F) -> Result<RunReport, QueryTallyError>
    where
        S: TallyStore,
        F: FnOnce() -> Result<S, StoreError>,
    {
        let source = log_path.display().to_string();
        let ingestion = self.ingester.ingest_file(log_path).await?;
        self.finish(source, ingestion, open_store).await
    }

    /// Run all stages against an already opened log source.
    pub async fn run_reader<R, S, F>(
        &self,
        reader: R,
        source: &str,
        open_store: F,
    ) -> Result<RunReport, QueryTallyError>
    where
        R: AsyncBufRead + Unpin,
        S: TallyStore,
        F: FnOnce() -> Result<S, StoreError>,
    {
        let ingestion = self.ingester.ingest(reader, source).await?;
        self.finish(source.to_owned(), ingestion, open_store).await
    }

    async fn finish<S, F>(
        &self,
        source: String,
        ingestion: Ingestion,
        open_store: F,
    ) -> Result<RunReport, QueryTallyError>
    where
        S: TallyStore,
        F: FnOnce() -> Result<S, StoreError>,
    {
        let reconciler = TallyReconciler::new(open_store()?);
        let reconcile = reconciler
            .reconcile(&ingestion.observations)
            .await
            .inspect_err(|e| {
                warn!(applied = e.applied, query = %e.query, "reconciliation aborted, reindex skipped");
            })?;

        let reindex_triggered = match &self.reindex_endpoint {
            Some(endpoint) => {
                self.trigger.trigger(endpoint).await?;
                true
            }
            None => {
                info!("reindex disabled, skipping trigger");
                false
            }
        };

        Ok(RunReport {
            source,
            ingest: ingestion.summary,
            reconcile,
            reindex_triggered,
        })
    }
}

/// Ingest a log file without touching any store or reindex endpoint.
pub async fn dry_run<P: ResultProbe>(
    ingester: &LogIngester<P>,
    log_path: &Path,
) -> Result<DryRunReport, QueryTallyError> {
    let ingestion = ingester.ingest_file(log_path).await?;
    Ok(DryRunReport {
        source: log_path.display().to_string(),
        ingest: ingestion.summary,
        observations: ingestion.observations,
    })
}
