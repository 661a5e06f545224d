//! `xcrun altool` upload-then-poll backend

use super::{Submission, Verdict, parse_json};
use crate::config::NotaryConfig;
use crate::error::{NotaryError, Result};
use crate::tool::ToolRunner;
use serde::Deserialize;
use std::path::Path;
use tokio::time::Instant;

const XCRUN: &str = "xcrun";

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(rename = "notarization-upload")]
    upload: UploadInfo,
}

#[derive(Deserialize)]
struct UploadInfo {
    #[serde(rename = "RequestUUID")]
    request_uuid: String,
}

#[derive(Deserialize)]
struct InfoResponse {
    #[serde(rename = "notarization-info")]
    info: RequestInfo,
}

#[derive(Deserialize)]
struct RequestInfo {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "LogFileURL", default)]
    log_file_url: Option<String>,
}

fn credentials(config: &NotaryConfig) -> Result<Vec<String>> {
    Ok(vec![
        "-u".to_string(),
        config.username()?.to_string(),
        "-p".to_string(),
        config.password()?.to_string(),
    ])
}

/// `altool --notarize-app`: returns as soon as the upload is accepted.
pub(super) async fn upload<R: ToolRunner>(
    config: &NotaryConfig,
    runner: &R,
    dmg: &Path,
) -> Result<Submission> {
    let mut args = vec![
        "altool".to_string(),
        "--notarize-app".to_string(),
        "--primary-bundle-id".to_string(),
        config.bundle_id()?.to_string(),
    ];
    args.extend(credentials(config)?);
    args.extend([
        "-f".to_string(),
        dmg.display().to_string(),
        "--output-format".to_string(),
        "json".to_string(),
    ]);

    step!("Uploading {} to Apple ...", dmg.display());
    let started = Instant::now();
    let output = runner
        .run(XCRUN, &args)
        .await?
        .check(XCRUN, "Upload failed")?;

    let response: UploadResponse = parse_json("altool", &output.stdout)?;
    info!("Request UUID: {}", response.upload.request_uuid);
    info!("Uploaded in {} seconds.", started.elapsed().as_secs());

    Ok(Submission {
        id: response.upload.request_uuid,
        status: None,
    })
}

/// Poll `altool --notarization-info` until the request leaves "in progress".
///
/// Sleeps the configured interval before every status check, so a request
/// that reports "in progress" N times is checked exactly N+1 times.
pub(super) async fn wait_for_result<R: ToolRunner>(
    config: &NotaryConfig,
    runner: &R,
    id: &str,
    started: Instant,
) -> Result<()> {
    let settings = &config.notarization;
    let mut args = vec![
        "altool".to_string(),
        "--notarization-info".to_string(),
        id.to_string(),
    ];
    args.extend(credentials(config)?);
    args.extend(["--output-format".to_string(), "json".to_string()]);

    step!("Waiting for results ...");
    let mut polls: u32 = 0;

    loop {
        if let Some(limit) = settings.poll_limit() {
            if polls >= limit {
                return Err(NotaryError::PollLimitExceeded {
                    id: id.to_string(),
                    polls,
                });
            }
        }

        tokio::time::sleep(settings.poll_interval()).await;
        polls += 1;

        let output = runner
            .run(XCRUN, &args)
            .await?
            .check(XCRUN, "Info request failed")?;
        let response: InfoResponse = parse_json("altool", &output.stdout)?;
        let info = response.info;

        info!(
            "{} ({} seconds)",
            info.status,
            started.elapsed().as_secs()
        );

        match Verdict::from_altool(&info.status) {
            Verdict::InProgress => continue,
            Verdict::Accepted => {
                success!("Notarization succeeded");
                return Ok(());
            }
            Verdict::Rejected(status) => {
                error!("Notarization failed");
                if let Some(url) = info.log_file_url.as_deref() {
                    eprintln!("    Log: {url}");
                }
                return Err(NotaryError::NotarizationFailed {
                    id: id.to_string(),
                    status,
                    log_url: info.log_file_url,
                });
            }
        }
    }
}
