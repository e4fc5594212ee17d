//! Command execution -- config resolution and collaborator wiring.
//!
//! `main` stays thin: it parses arguments, calls [`resolve_config`],
//! installs logging, then hands over to [`execute`].

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use querytally_core::config::QueryTallyConfig;
use querytally_core::error::{ConfigError, QueryTallyError};
use querytally_core::pipeline::ResultProbe;
use querytally_ingest::{CachedProbe, LineExtractor, LogIngester, SolrProbe};
use querytally_tally::SqliteTallyStore;

use crate::cli::{Cli, DEFAULT_CONFIG_PATH};
use crate::error::CliError;
use crate::orchestrator::{self, DryRunReport, Orchestrator, RunReport};
use crate::output::{Render, ValidatedConfig};
use crate::reindex::HttpReindexTrigger;

/// What a command produced.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Run(RunReport),
    DryRun(DryRunReport),
    Validated(ValidatedConfig),
}

impl Render for Outcome {
    fn render_text(&self, w: &mut dyn std::io::Write) -> std::io::Result<()> {
        match self {
            Self::Run(report) => report.render_text(w),
            Self::DryRun(report) => report.render_text(w),
            Self::Validated(config) => config.render_text(w),
        }
    }
}

/// Resolve the effective configuration.
///
/// Order: file (or defaults), then `QUERYTALLY_*` env, then CLI flags,
/// then a single validation pass. A missing file is only an error when
/// it was named explicitly with `--config`.
pub async fn resolve_config(cli: &Cli) -> Result<QueryTallyConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => QueryTallyConfig::from_file(path).await?,
        None => QueryTallyConfig::from_file_or_default(DEFAULT_CONFIG_PATH).await?,
    };
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Execute the command described by `cli` with a resolved configuration.
pub async fn execute(cli: &Cli, config: QueryTallyConfig) -> Result<Outcome, CliError> {
    if cli.validate {
        return Ok(Outcome::Validated(ValidatedConfig {
            valid: true,
            config,
        }));
    }

    let log_path = cli.log_file.as_deref().ok_or_else(|| {
        CliError::Run(QueryTallyError::Config(ConfigError::InvalidValue {
            field: "log_file".to_owned(),
            reason: "an access log path is required".to_owned(),
        }))
    })?;

    let probe = SolrProbe::new(
        &config.search.endpoint,
        Duration::from_secs(config.search.timeout_secs),
    )?;
    if config.search.cache_probes {
        execute_with_probe(cli, &config, log_path, CachedProbe::new(probe)).await
    } else {
        execute_with_probe(cli, &config, log_path, probe).await
    }
}

async fn execute_with_probe<P: ResultProbe>(
    cli: &Cli,
    config: &QueryTallyConfig,
    log_path: &Path,
    probe: P,
) -> Result<Outcome, CliError> {
    let extractor = LineExtractor::new(&config.ingest.handler_path)?;
    let ingester = LogIngester::new(extractor, probe);

    if cli.dry_run {
        let report = orchestrator::dry_run(&ingester, log_path).await?;
        return Ok(Outcome::DryRun(report));
    }

    let trigger = HttpReindexTrigger::new(Duration::from_secs(config.reindex.timeout_secs))?;
    let reindex_endpoint = config
        .reindex
        .enabled
        .then(|| config.reindex.endpoint.clone());

    let orchestrator = Orchestrator::new(ingester, trigger, reindex_endpoint);
    let report = orchestrator
        .run(log_path, || {
            SqliteTallyStore::open(Path::new(&config.store.path), &config.store.table)
        })
        .await?;
    Ok(Outcome::Run(report))
}
