//! Error types for the notarization workflow.

use crate::notarization::Issue;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotaryError>;

/// Exit code for a notarization the service rejected with reported issues.
pub const EXIT_REJECTED: i32 = -1;

/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
pub enum NotaryError {
    #[error("Missing required configuration: [{section}] {key}")]
    MissingConfig {
        section: &'static str,
        key: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not parse configuration file: {0}")]
    ConfigParse(#[from] ini::ParseError),

    #[error(
        "No disk image builder configured.\n\
         Add a [build] command to the configuration file or supply a DmgBuilder."
    )]
    BuildNotImplemented,

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("{message}:\n{stderr}")]
    ToolFailed {
        message: String,
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected output from {tool}: {reason}")]
    MalformedResponse { tool: String, reason: String },

    #[error("Notarization rejected with status {status} (request {id})")]
    Rejected {
        id: String,
        status: String,
        issues: Vec<Issue>,
    },

    #[error("Notarization failed with status: {status} (request {id})")]
    NotarizationFailed {
        id: String,
        status: String,
        log_url: Option<String>,
    },

    #[error("Gave up on request {id} after {polls} status checks still in progress")]
    PollLimitExceeded { id: String, polls: u32 },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotaryError {
    /// Process exit code the CLI reports for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Rejected { .. } => EXIT_REJECTED,
            _ => EXIT_FAILURE,
        }
    }
}
