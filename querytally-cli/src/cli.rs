//! CLI argument parsing using clap derive API
//!
//! Purely declarative. Flags here override both the config file and
//! `QUERYTALLY_*` environment variables.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use querytally_core::config::QueryTallyConfig;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "querytally.toml";

/// querytally -- tally search queries from an access log and refresh autosuggest.
///
/// Reads the log, checks each query against the search backend, updates
/// per-query counts in the tally store, then triggers an autosuggest reindex.
#[derive(Parser, Debug)]
#[command(name = "querytally", version, about, long_about = None)]
pub struct Cli {
    /// Access log file to read.
    #[arg(required_unless_present = "validate")]
    pub log_file: Option<PathBuf>,

    /// Path to the querytally.toml configuration file.
    ///
    /// When omitted, `querytally.toml` in the working directory is used if present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Search handler path whose `q=` parameter is tallied.
    #[arg(long)]
    pub handler_path: Option<String>,

    /// Search core URL used for result probes.
    #[arg(long)]
    pub search_endpoint: Option<String>,

    /// SQLite file holding the tally table.
    #[arg(long)]
    pub store_path: Option<String>,

    /// URL called after tallies are updated.
    #[arg(long)]
    pub reindex_endpoint: Option<String>,

    /// Skip the reindex call.
    #[arg(long)]
    pub no_reindex: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Output format for the run report.
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Ingest only and print the observations. Touches neither store nor reindex.
    #[arg(long, conflicts_with = "validate")]
    pub dry_run: bool,

    /// Validate the effective configuration and exit.
    #[arg(long)]
    pub validate: bool,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl Cli {
    /// Apply command-line overrides on top of file and env settings.
    pub fn apply_overrides(&self, config: &mut QueryTallyConfig) {
        if let Some(handler_path) = &self.handler_path {
            config.ingest.handler_path.clone_from(handler_path);
        }
        if let Some(endpoint) = &self.search_endpoint {
            config.search.endpoint.clone_from(endpoint);
        }
        if let Some(path) = &self.store_path {
            config.store.path.clone_from(path);
        }
        if let Some(endpoint) = &self.reindex_endpoint {
            config.reindex.endpoint.clone_from(endpoint);
        }
        if self.no_reindex {
            config.reindex.enabled = false;
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_file_is_required_for_a_run() {
        assert!(Cli::try_parse_from(["querytally"]).is_err());
        let cli = Cli::try_parse_from(["querytally", "access.log"]).unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("access.log")));
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn validate_does_not_need_a_log_file() {
        let cli = Cli::try_parse_from(["querytally", "--validate"]).unwrap();
        assert!(cli.validate);
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn dry_run_conflicts_with_validate() {
        assert!(Cli::try_parse_from(["querytally", "--dry-run", "--validate"]).is_err());
    }

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::try_parse_from([
            "querytally",
            "access.log",
            "--handler-path",
            "/solr/shop/browse",
            "--search-endpoint",
            "http://solr:8983/solr/shop",
            "--store-path",
            "/tmp/tally.db",
            "--no-reindex",
            "--log-format",
            "json",
        ])
        .unwrap();

        let mut config = QueryTallyConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.ingest.handler_path, "/solr/shop/browse");
        assert_eq!(config.search.endpoint, "http://solr:8983/solr/shop");
        assert_eq!(config.store.path, "/tmp/tally.db");
        assert!(!config.reindex.enabled);
        assert_eq!(config.general.log_format, "json");
        // 지정하지 않은 값은 그대로
        assert_eq!(config.general.log_level, "info");
    }
}
