#![allow(dead_code)]

use notary::{DmgBuilder, NotaryConfig, NotaryError, ToolOutput, ToolRunner};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// One recorded invocation: program followed by its arguments.
pub type Call = Vec<String>;

/// Replays canned outputs in order and records every call.
///
/// Once the script runs out, further calls succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    outputs: RefCell<VecDeque<ToolOutput>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedRunner {
    pub fn new(outputs: impl IntoIterator<Item = ToolOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into_iter().collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Calls whose first arguments match `prefix`, e.g. `["xcrun", "stapler"]`.
    pub fn calls_to(&self, prefix: &[&str]) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| {
                call.len() >= prefix.len() && call.iter().zip(prefix).all(|(a, b)| a == b)
            })
            .cloned()
            .collect()
    }
}

impl ToolRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> notary::Result<ToolOutput> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        self.calls.borrow_mut().push(call);

        Ok(self.outputs.borrow_mut().pop_front().unwrap_or_else(|| ok("")))
    }
}

/// Builder that only counts how often it ran.
#[derive(Default)]
pub struct CountingBuilder {
    pub builds: Cell<u32>,
}

impl DmgBuilder for CountingBuilder {
    async fn build_dmg(&self, _config: &NotaryConfig) -> notary::Result<()> {
        self.builds.set(self.builds.get() + 1);
        Ok(())
    }
}

/// Builder that always fails the way a broken `hdiutil` run would.
pub struct FailingBuilder;

impl DmgBuilder for FailingBuilder {
    async fn build_dmg(&self, _config: &NotaryConfig) -> notary::Result<()> {
        Err(NotaryError::ToolFailed {
            message: "Disk image build failed".to_string(),
            program: "hdiutil".to_string(),
            code: Some(1),
            stderr: "hdiutil: create failed - Resource busy".to_string(),
        })
    }
}

pub fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn fail(code: i32, stderr: &str) -> ToolOutput {
    ToolOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub fn notarytool_submitted(id: &str, status: &str) -> ToolOutput {
    ok(&format!(
        r#"{{"id": "{id}", "status": "{status}", "message": "Processing complete"}}"#
    ))
}

pub fn notarytool_log(id: &str, issues: &str) -> ToolOutput {
    ok(&format!(
        r#"{{"jobId": "{id}", "status": "Invalid", "statusSummary": "Archive contains critical validation errors", "issues": {issues}}}"#
    ))
}

pub fn altool_uploaded(uuid: &str) -> ToolOutput {
    ok(&format!(
        r#"{{"notarization-upload": {{"RequestUUID": "{uuid}"}}, "success-message": "No errors uploading 'App.dmg'.", "os-version": "12.6.0", "tool-version": "4.071.1221"}}"#
    ))
}

pub fn altool_status(status: &str) -> ToolOutput {
    ok(&format!(
        r#"{{"notarization-info": {{"Status": "{status}", "RequestUUID": "r1", "LogFileURL": "https://osxapps-ssl.itunes.apple.com/log/r1"}}, "success-message": "No errors getting notarization info."}}"#
    ))
}

pub const BASE_CONFIG: &str = "
[developer]
username = dev@example.com
password = abcd-efgh-ijkl-mnop
identity = Developer ID Application: Example (TEAM123)
team_id = TEAM123

[app]
app_name = App
app_path = App.app
dmg_path = App.dmg
bundle_id = com.example.app
";

pub fn notarytool_config() -> NotaryConfig {
    BASE_CONFIG.parse().expect("valid config")
}

pub fn altool_config(poll_interval_secs: u64, max_polls: u32) -> NotaryConfig {
    format!(
        "{BASE_CONFIG}\n[notarization]\nbackend = altool\npoll_interval_secs = {poll_interval_secs}\nmax_polls = {max_polls}\n"
    )
    .parse()
    .expect("valid config")
}
