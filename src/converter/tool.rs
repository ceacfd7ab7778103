//! External tool invocation.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors that prevent an external tool run from producing its output.
#[derive(Debug, Error)]
pub enum ToolRunError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect output of {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exceeded the {limit:?} limit")]
    TimedOut { tool: String, limit: Duration },
}

/// How the fetch and transcode tools are located and invoked.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Fetch tool executable (yt-dlp).
    pub fetch_tool: PathBuf,
    /// ffmpeg binary or the directory containing it. `None` relies on `PATH`.
    pub ffmpeg_location: Option<PathBuf>,
    /// Audio codec/extension requested from the fetch tool.
    pub audio_format: String,
    /// Passed through as `--postprocessor-args`.
    pub postprocessor_args: Option<String>,
    /// Extra arguments inserted before the output template.
    pub extra_args: Vec<String>,
    pub conversion_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            fetch_tool: PathBuf::from("yt-dlp"),
            ffmpeg_location: None,
            audio_format: "mp3".to_string(),
            postprocessor_args: None,
            extra_args: Vec::new(),
            conversion_timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl ToolConfig {
    /// Path of the ffmpeg executable, resolving a configured directory.
    pub fn transcode_binary(&self) -> PathBuf {
        match &self.ffmpeg_location {
            Some(location) if location.is_dir() => {
                location.join(format!("ffmpeg{}", std::env::consts::EXE_SUFFIX))
            }
            Some(location) => location.clone(),
            None => PathBuf::from("ffmpeg"),
        }
    }

    /// Builds the fetch tool invocation for a single target.
    ///
    /// The tool prints the final path, the title and the duration, each on its
    /// own line, in no guaranteed order.
    pub fn fetch_command(&self, output_template: &str, target: &str) -> Command {
        let mut command = Command::new(&self.fetch_tool);
        command
            .arg("-x")
            .arg("--audio-format")
            .arg(&self.audio_format);
        if let Some(args) = &self.postprocessor_args {
            command.arg("--postprocessor-args").arg(args);
        }
        if let Some(location) = &self.ffmpeg_location {
            command.arg("--ffmpeg-location").arg(location);
        }
        command
            .args(&self.extra_args)
            .arg("-o")
            .arg(output_template)
            .args(["--print", "after_move:filepath"])
            .args(["--print", "title"])
            .args(["--print", "duration_string"])
            .arg(target);
        command
    }
}

/// Runs `command` to completion, capturing its output.
///
/// On unix the tool leads its own process group. If `limit` elapses first the
/// whole group is killed, so neither the tool nor anything it spawned (ffmpeg)
/// outlives the call.
pub async fn run_tool(mut command: Command, limit: Duration) -> Result<Output, ToolRunError> {
    let tool = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();

    command
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    command.process_group(0);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(source) => return Err(ToolRunError::Launch { tool, source }),
    };
    let pid = child.id();

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ToolRunError::Wait { tool, source }),
        Err(_) => {
            kill_process_group(&tool, pid);
            Err(ToolRunError::TimedOut { tool, limit })
        }
    }
}

#[cfg(unix)]
fn kill_process_group(tool: &str, pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    match i32::try_from(pid) {
        Ok(pgid) => {
            if let Err(err) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                debug!("Could not kill process group of {} ({}): {}", tool, pid, err);
            }
        }
        Err(_) => warn!("Process id {} of {} out of range", pid, tool),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_tool: &str, _pid: Option<u32>) {}
