//! Output formatting abstraction for text vs JSON rendering
//!
//! Every report the binary prints flows through [`OutputWriter`], which
//! handles format switching. Logs go to stderr; this is the only stdout writer.

use std::io::Write;

use serde::Serialize;

use querytally_core::config::QueryTallyConfig;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::orchestrator::{DryRunReport, RunReport};

/// Writes reports in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(&mut handle, payload)
    }

    /// Render a payload to an arbitrary writer.
    ///
    /// For `Text` format, delegates to `Render::render_text()`.
    /// For `Json` format, serialises via `serde_json`.
    pub fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        payload: &T,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable text rendering, implemented alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Source:             {}", self.source)?;
        writeln!(w, "Lines read:         {}", self.ingest.lines_read)?;
        writeln!(w, "Queries extracted:  {}", self.ingest.queries_extracted)?;
        writeln!(w, "Tallies inserted:   {}", self.reconcile.inserted)?;
        writeln!(w, "Tallies updated:    {}", self.reconcile.updated)?;
        writeln!(
            w,
            "Reindex:            {}",
            if self.reindex_triggered {
                "triggered"
            } else {
                "skipped"
            }
        )?;
        Ok(())
    }
}

impl Render for DryRunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{}: {} lines read, {} queries extracted (dry run)",
            self.source, self.ingest.lines_read, self.ingest.queries_extracted
        )?;
        if self.observations.is_empty() {
            return Ok(());
        }
        writeln!(w)?;
        writeln!(w, "{:<8} Query", "Results")?;
        writeln!(w, "{}", "-".repeat(40))?;
        for observation in &self.observations {
            writeln!(
                w,
                "{:<8} {}",
                if observation.has_results() { "yes" } else { "no" },
                observation.query()
            )?;
        }
        Ok(())
    }
}

/// Effective configuration after `--validate`.
#[derive(Debug, Serialize)]
pub struct ValidatedConfig {
    pub valid: bool,
    pub config: QueryTallyConfig,
}

impl Render for ValidatedConfig {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let c = &self.config;
        writeln!(w, "Configuration is valid.")?;
        writeln!(w, "  handler path:     {}", c.ingest.handler_path)?;
        writeln!(
            w,
            "  search endpoint:  {} (timeout {}s, cache {})",
            c.search.endpoint, c.search.timeout_secs, c.search.cache_probes
        )?;
        writeln!(w, "  store:            {} (table {})", c.store.path, c.store.table)?;
        if c.reindex.enabled {
            writeln!(w, "  reindex endpoint: {}", c.reindex.endpoint)?;
        } else {
            writeln!(w, "  reindex:          disabled")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querytally_core::types::QueryObservation;
    use querytally_ingest::IngestSummary;
    use querytally_tally::ReconcileSummary;

    fn report() -> RunReport {
        RunReport {
            source: "access.log".to_owned(),
            ingest: IngestSummary {
                lines_read: 10,
                queries_extracted: 4,
            },
            reconcile: ReconcileSummary {
                inserted: 3,
                updated: 1,
            },
            reindex_triggered: true,
        }
    }

    fn render(format: OutputFormat, payload: &(impl Render + Serialize)) -> String {
        let mut buffer = Vec::new();
        OutputWriter::new(format)
            .render_to(&mut buffer, payload)
            .expect("rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_run_report_text() {
        let output = render(OutputFormat::Text, &report());
        assert!(output.contains("Tallies inserted:   3"));
        assert!(output.contains("Reindex:            triggered"));
    }

    #[test]
    fn test_run_report_json() {
        let output = render(OutputFormat::Json, &report());
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("should parse JSON");
        assert_eq!(parsed["ingest"]["queries_extracted"].as_u64(), Some(4));
        assert_eq!(parsed["reconcile"]["updated"].as_u64(), Some(1));
        assert_eq!(parsed["reindex_triggered"].as_bool(), Some(true));
    }

    #[test]
    fn test_dry_run_lists_observations_in_order() {
        let payload = DryRunReport {
            source: "access.log".to_owned(),
            ingest: IngestSummary {
                lines_read: 3,
                queries_extracted: 2,
            },
            observations: vec![
                QueryObservation::new("red shoes", true),
                QueryObservation::new("日本語", false),
            ],
        };
        let output = render(OutputFormat::Text, &payload);
        let red = output.find("red shoes").expect("first query listed");
        let jp = output.find("日本語").expect("second query listed");
        assert!(red < jp);
        assert!(output.contains("(dry run)"));
    }

    #[test]
    fn test_dry_run_json_keeps_observation_fields() {
        let payload = DryRunReport {
            source: "access.log".to_owned(),
            ingest: IngestSummary::default(),
            observations: vec![QueryObservation::new("boots", false)],
        };
        let output = render(OutputFormat::Json, &payload);
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("should parse JSON");
        assert_eq!(parsed["observations"][0]["query"].as_str(), Some("boots"));
        assert_eq!(parsed["observations"][0]["has_results"].as_bool(), Some(false));
    }

    #[test]
    fn test_validated_config_mentions_disabled_reindex() {
        let mut config = QueryTallyConfig::default();
        config.reindex.enabled = false;
        let output = render(
            OutputFormat::Text,
            &ValidatedConfig {
                valid: true,
                config,
            },
        );
        assert!(output.contains("reindex:          disabled"));
    }
}
