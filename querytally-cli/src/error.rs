//! CLI-specific error types and exit code mapping

use querytally_core::error::QueryTallyError;
use querytally_ingest::IngestError;
use querytally_tally::ReconcileError;

/// CLI-specific error type.
///
/// `exit_code()` maps each pipeline stage failure to its own process exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A pipeline stage (or config loading) failed.
    #[error("{0}")]
    Run(#[from] QueryTallyError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Writing the report to stdout failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                 |
    /// |------|-------------------------|
    /// | 0    | Success                 |
    /// | 1    | Output / IO error       |
    /// | 2    | Configuration error     |
    /// | 3    | Log read error          |
    /// | 4    | Query decode error      |
    /// | 5    | Search backend error    |
    /// | 6    | Tally store error       |
    /// | 7    | Reindex trigger error   |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Run(e) => match e {
                QueryTallyError::Config(_) => 2,
                QueryTallyError::LogRead(_) => 3,
                QueryTallyError::Decode { .. } => 4,
                QueryTallyError::Backend { .. } => 5,
                QueryTallyError::Store { .. } => 6,
                QueryTallyError::Trigger(_) => 7,
            },
            Self::JsonSerialize(_) | Self::Io(_) => 1,
        }
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        Self::Run(e.into())
    }
}

impl From<ReconcileError> for CliError {
    fn from(e: ReconcileError) -> Self {
        Self::Run(e.into())
    }
}

impl From<querytally_core::error::StoreError> for CliError {
    fn from(e: querytally_core::error::StoreError) -> Self {
        Self::Run(e.into())
    }
}

impl From<querytally_core::error::TriggerError> for CliError {
    fn from(e: querytally_core::error::TriggerError) -> Self {
        Self::Run(e.into())
    }
}
