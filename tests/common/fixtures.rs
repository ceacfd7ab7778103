//! Stub executables standing in for yt-dlp and ffmpeg
//!
//! The stubs are written once per test binary and shared by every server.

use super::constants::*;
use super::test_support::write_script;
use audio_fetch_server::converter::ToolConfig;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

struct StubTools {
    _dir: TempDir,
    fetch_tool: PathBuf,
    ffmpeg: PathBuf,
}

static STUB_TOOLS: OnceLock<StubTools> = OnceLock::new();

fn fetch_tool_script() -> String {
    format!(
        r#"if [ "$1" = "--version" ]; then echo "{version}"; exit 0; fi
for a in "$@"; do last="$a"; done
while [ $# -gt 0 ]; do if [ "$1" = "-o" ]; then tmpl="$2"; fi; shift; done
case "$last" in
  *{hang}*) exec sleep 30 ;;
  *{fail}*) echo "{error}" >&2; exit 1 ;;
esac
file=$(echo "$tmpl" | sed -e 's/%(title)s/{title}/' -e 's/%(ext)s/mp3/')
printf '%s' '{audio}' > "$file"
echo "{title}"
echo "{duration}"
echo "$file""#,
        version = STUB_FETCH_TOOL_VERSION,
        hang = HANG_MARKER,
        fail = FAIL_MARKER,
        error = STUB_ERROR_LINE,
        title = STUB_TITLE,
        audio = String::from_utf8_lossy(STUB_AUDIO_BYTES),
        duration = STUB_DURATION,
    )
}

fn ffmpeg_script() -> String {
    format!(
        r#"if [ "$1" = "-version" ]; then
  echo "ffmpeg version {version} Copyright (c) 2000-2024 the FFmpeg developers"
  echo "built with gcc 13"
  exit 0
fi
exit 1"#,
        version = STUB_FFMPEG_VERSION,
    )
}

fn stub_tools() -> &'static StubTools {
    STUB_TOOLS.get_or_init(|| {
        let dir = TempDir::new().expect("Failed to create stub tools dir");
        let fetch_tool = write_script(dir.path(), "yt-dlp", &fetch_tool_script());
        let ffmpeg = write_script(dir.path(), "ffmpeg", &ffmpeg_script());
        StubTools {
            _dir: dir,
            fetch_tool,
            ffmpeg,
        }
    })
}

/// Tool configuration pointing at the stubs, with a short conversion limit.
pub fn stub_tool_config() -> ToolConfig {
    let tools = stub_tools();
    ToolConfig {
        fetch_tool: tools.fetch_tool.clone(),
        ffmpeg_location: Some(tools.ffmpeg.clone()),
        conversion_timeout: Duration::from_millis(CONVERSION_TIMEOUT_MS),
        probe_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}
