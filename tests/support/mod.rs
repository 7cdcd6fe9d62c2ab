//! Fake download tools written as `sh` scripts.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use ytdlp_frontend::{
    DownloadJob, FormatCode, JobEvent, JobHandle, OutputTemplate, ResourceUrl, ToolConfig,
};

/// A script on disk plus the tool config that runs it through `sh`.
pub struct FakeTool {
    _dir: TempDir,
    pub script: PathBuf,
    pub tool: ToolConfig,
}

/// Writes `body` to a script and returns a tool config running `sh <script>`.
///
/// Going through `sh` means the script never needs the exec bit, so tests
/// running in parallel never hit ETXTBSY.
pub fn fake_tool(body: &str) -> FakeTool {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("fake-yt-dlp.sh");
    fs::write(&script, body).expect("write script");
    let tool = ToolConfig::new("sh").with_base_args([script.display().to_string()]);
    FakeTool {
        _dir: dir,
        script,
        tool,
    }
}

/// Prints progress for the URL it is given, plus one stderr line.
pub const DOWNLOAD_SCRIPT: &str = r#"
for last; do :; done
echo "[youtube] Extracting URL: $last"
echo "[download]   0.0% of 10.00MiB for $last"
echo "[download]  42.3% of 10.00MiB for $last"
echo "WARNING: throttled $last" >&2
echo "[download] 100.0% of 10.00MiB for $last"
exit 0
"#;

pub fn job(url: &str) -> DownloadJob {
    DownloadJob {
        url: ResourceUrl::parse(url).expect("valid url"),
        format: FormatCode::parse("137").expect("valid code"),
        output: OutputTemplate::parse("/tmp/%(title)s.%(ext)s").expect("valid template"),
        playlist: false,
    }
}

/// Collects events from `handle` until `Finished`, polling like the UI does.
pub fn drain_until_finished(handle: &mut JobHandle) -> Vec<JobEvent> {
    let deadline = Instant::now() + Duration::from_secs(20);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        events.extend(handle.drain());
        if events.last() == Some(&JobEvent::Finished) {
            return events;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("job did not finish, got {events:?}");
}

pub fn output_lines(events: &[JobEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Output(line) => Some(line.as_str()),
            _ => None,
        })
        .collect()
}

pub fn progress_samples(events: &[JobEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}
