//! CLI-specific error types and exit code mapping

use distfinder_analyzer::AnalyzerError;
use distfinder_analyzer::error::message_chain;
use distfinder_core::error::{AnalysisError, DistfinderError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// A root input does not exist.
    #[error("input not found: {0}")]
    InputNotFound(String),

    /// Fatal analyzer error (checksum failure, incompatible cache, ...).
    #[error("analysis error: {0}")]
    Analysis(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, interrupted analysis, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from distfinder-core.
    #[error("{0}")]
    Core(#[from] DistfinderError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command error              |
    /// | 2    | Configuration error                  |
    /// | 3    | Input not found                      |
    /// | 4    | Analysis failure                     |
    /// | 10   | IO error (including interruption)    |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::InputNotFound(_) => 3,
            Self::Analysis(_) => 4,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                DistfinderError::Config(_) => 2,
                DistfinderError::Io(_) => 10,
                DistfinderError::Analysis(AnalysisError::InputNotFound(_)) => 3,
                DistfinderError::Analysis(AnalysisError::Cancelled) => 10,
                DistfinderError::Analysis(_) => 4,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<AnalyzerError> for CliError {
    fn from(e: AnalyzerError) -> Self {
        match e {
            AnalyzerError::InputNotFound { input } => Self::InputNotFound(input),
            AnalyzerError::UnsupportedInput { .. } => Self::Command(e.to_string()),
            AnalyzerError::Config { .. } => Self::Config(e.to_string()),
            AnalyzerError::Cancelled => Self::Io(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "analysis cancelled",
            )),
            AnalyzerError::Io { path, source } => {
                Self::Io(std::io::Error::new(source.kind(), format!("{path}: {source}")))
            }
            AnalyzerError::Output { .. } => Self::Io(std::io::Error::other(e.to_string())),
            other => Self::Analysis(message_chain(&other)),
        }
    }
}
