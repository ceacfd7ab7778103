//! Availability checks of the external tools, used for health reporting.

use super::tool::{run_tool, ToolConfig};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

lazy_static! {
    static ref FFMPEG_VERSION: Regex =
        Regex::new(r"ffmpeg version (\S+)").expect("ffmpeg version pattern is valid");
}

const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAvailability {
    pub fetch_tool_ok: bool,
    pub fetch_tool_version: Option<String>,
    pub transcode_tool_ok: bool,
    pub transcode_tool_version: Option<String>,
}

impl ToolAvailability {
    pub fn all_ok(&self) -> bool {
        self.fetch_tool_ok && self.transcode_tool_ok
    }
}

/// Checks both tools concurrently. A tool that cannot be run, fails or does
/// not answer within the probe timeout is reported as unavailable.
pub async fn probe(config: &ToolConfig) -> ToolAvailability {
    let transcode_binary = config.transcode_binary();
    let (fetch_tool_version, transcode_tool_version) = tokio::join!(
        version_output(&config.fetch_tool, "--version", config.probe_timeout),
        version_output(&transcode_binary, "-version", config.probe_timeout),
    );

    let fetch_tool_version = fetch_tool_version.map(|stdout| stdout.trim().to_string());
    let transcode_tool_version = transcode_tool_version.map(|stdout| parse_ffmpeg_version(&stdout));

    ToolAvailability {
        fetch_tool_ok: fetch_tool_version.is_some(),
        fetch_tool_version,
        transcode_tool_ok: transcode_tool_version.is_some(),
        transcode_tool_version,
    }
}

async fn version_output(binary: &Path, flag: &str, limit: Duration) -> Option<String> {
    let mut command = Command::new(binary);
    command.arg(flag);
    match run_tool(command, limit).await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!("{} {} exited with {}", binary.display(), flag, output.status);
            None
        }
        Err(err) => {
            debug!("{} probe failed: {}", binary.display(), err);
            None
        }
    }
}

fn parse_ffmpeg_version(stdout: &str) -> String {
    stdout
        .lines()
        .next()
        .and_then(|line| FFMPEG_VERSION.captures(line))
        .and_then(|captures| captures.get(1))
        .map(|version| version.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
