//! Notarization client
//!
//! Submits a disk image to Apple's notarization service and waits for the
//! verdict. Two backends are supported:
//! - `notarytool` - `submit --wait` blocks until the service returns a
//!   verdict, which arrives in the same JSON response. On rejection the
//!   request log is fetched and its errors reported.
//! - `altool` - the upload returns a request UUID, then the status is polled
//!   on a fixed interval until it leaves "in progress".
//!
//! A nonzero exit from either tool is fatal immediately. Nothing is retried.

mod altool;
mod notarytool;

use crate::config::{Backend, NotaryConfig};
use crate::error::{NotaryError, Result};
use crate::tool::ToolRunner;
use serde::Deserialize;
use std::path::Path;
use tokio::time::Instant;

/// Outcome reported by the notarization service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    InProgress,
    Accepted,
    /// Any terminal status other than acceptance, as the service spelled it.
    Rejected(String),
}

impl Verdict {
    /// Interpret a notarytool `status` field.
    #[must_use]
    pub fn from_notarytool(status: &str) -> Self {
        match status {
            "Accepted" => Self::Accepted,
            "In Progress" => Self::InProgress,
            other => Self::Rejected(other.to_string()),
        }
    }

    /// Interpret an altool `Status` field.
    #[must_use]
    pub fn from_altool(status: &str) -> Self {
        match status {
            "success" => Self::Accepted,
            "in progress" => Self::InProgress,
            other => Self::Rejected(other.to_string()),
        }
    }
}

/// A request accepted by the notarization service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Request id (notarytool) or RequestUUID (altool).
    pub id: String,

    /// Status reported with the submission itself. Only notarytool's
    /// submit-and-wait mode fills this in.
    pub status: Option<String>,
}

/// One entry of a notarization log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}

/// Log document returned by `notarytool log`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizationLog {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_summary: Option<String>,
    #[serde(default)]
    pub issues: Option<Vec<Issue>>,
}

impl NotarizationLog {
    /// Issues with `error` severity.
    #[must_use]
    pub fn errors(&self) -> Vec<Issue> {
        self.issues
            .iter()
            .flatten()
            .filter(|issue| issue.is_error())
            .cloned()
            .collect()
    }
}

/// Drives one notarization tool on behalf of the workflow.
pub struct NotarizationClient<'a, R> {
    config: &'a NotaryConfig,
    runner: &'a R,
    started: Instant,
}

impl<'a, R: ToolRunner> NotarizationClient<'a, R> {
    pub fn new(config: &'a NotaryConfig, runner: &'a R) -> Self {
        Self {
            config,
            runner,
            started: Instant::now(),
        }
    }

    /// Measure reported elapsed times from `started` instead of now.
    #[must_use]
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.config.notarization.backend
    }

    /// Upload the disk image. With notarytool this also waits for the verdict.
    pub async fn submit(&self, dmg: &Path) -> Result<Submission> {
        if !tokio::fs::try_exists(dmg).await.unwrap_or(false) {
            warn!("No disk image at {}", dmg.display());
        }

        match self.backend() {
            Backend::NotaryTool => notarytool::submit(self.config, self.runner, dmg).await,
            Backend::AlTool => altool::upload(self.config, self.runner, dmg).await,
        }
    }

    /// Resolve the submission to success or an error describing the failure.
    pub async fn await_verdict(&self, submission: &Submission) -> Result<()> {
        match self.backend() {
            Backend::NotaryTool => self.check_submitted_status(submission).await,
            Backend::AlTool => {
                altool::wait_for_result(
                    self.config,
                    self.runner,
                    &submission.id,
                    self.started,
                )
                .await
            }
        }
    }

    /// Submit and wait in one call.
    pub async fn notarize(&self, dmg: &Path) -> Result<()> {
        let submission = self.submit(dmg).await?;
        self.await_verdict(&submission).await
    }

    async fn check_submitted_status(&self, submission: &Submission) -> Result<()> {
        let status = submission.status.as_deref().unwrap_or_default();

        if Verdict::from_notarytool(status) == Verdict::Accepted {
            success!("Notarization accepted");
            return Ok(());
        }

        let log = notarytool::fetch_log(self.config, self.runner, &submission.id).await?;
        let issues = log.errors();

        error!("Notarization status: {status}");
        eprint!("{}", issue_report(&issues));

        Err(NotaryError::Rejected {
            id: submission.id.clone(),
            status: status.to_string(),
            issues,
        })
    }
}

/// Parse a tool's JSON stdout, naming the tool on failure.
/// Path and message of each issue, message indented under its path.
fn issue_report(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| {
            format!(
                "  {}\n    {}\n",
                issue.path.as_deref().unwrap_or("<unknown path>"),
                issue.message
            )
        })
        .collect()
}

fn parse_json<T: serde::de::DeserializeOwned>(tool: &str, stdout: &str) -> Result<T> {
    serde_json::from_str(stdout).map_err(|e| NotaryError::MalformedResponse {
        tool: tool.to_string(),
        reason: format!("{e}\n{}", stdout.trim()),
    })
}
