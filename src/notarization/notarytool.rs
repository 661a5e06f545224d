//! `xcrun notarytool` submit-and-wait backend

use super::{NotarizationLog, Submission, parse_json};
use crate::config::NotaryConfig;
use crate::error::{NotaryError, Result};
use crate::tool::ToolRunner;
use serde::Deserialize;
use std::path::Path;

const XCRUN: &str = "xcrun";

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn credentials(config: &NotaryConfig) -> Result<Vec<String>> {
    Ok(vec![
        "--apple-id".to_string(),
        config.username()?.to_string(),
        "--password".to_string(),
        config.password()?.to_string(),
        "--team-id".to_string(),
        config.team_id()?.to_string(),
    ])
}

/// `notarytool submit --wait`: uploads and blocks until a verdict is in.
pub(super) async fn submit<R: ToolRunner>(
    config: &NotaryConfig,
    runner: &R,
    dmg: &Path,
) -> Result<Submission> {
    let mut args = vec!["notarytool".to_string(), "submit".to_string()];
    args.extend(credentials(config)?);
    args.extend([
        "--output-format".to_string(),
        "json".to_string(),
        "--wait".to_string(),
        dmg.display().to_string(),
    ]);

    step!("Notarizing {}", dmg.display());
    let output = runner
        .run(XCRUN, &args)
        .await?
        .check(XCRUN, "Upload failed")?;

    let response: SubmitResponse = parse_json("notarytool", &output.stdout)?;
    let status = response.status.ok_or_else(|| NotaryError::MalformedResponse {
        tool: "notarytool".to_string(),
        reason: format!("submission {} reported no status", response.id),
    })?;

    info!("Notarization uuid: {}", response.id);
    info!("Notarization status: {status}");
    if let Some(message) = response.message.as_deref() {
        info!("{message}");
    }

    Ok(Submission {
        id: response.id,
        status: Some(status),
    })
}

/// `notarytool log <id>`: the issue report for a finished request.
pub(super) async fn fetch_log<R: ToolRunner>(
    config: &NotaryConfig,
    runner: &R,
    id: &str,
) -> Result<NotarizationLog> {
    let mut args = vec!["notarytool".to_string(), "log".to_string()];
    args.extend(credentials(config)?);
    args.push(id.to_string());

    let output = runner
        .run(XCRUN, &args)
        .await?
        .check(XCRUN, "Log request failed")?;

    parse_json("notarytool", &output.stdout)
}
