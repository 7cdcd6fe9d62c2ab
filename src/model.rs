use crate::command::{FormatCode, OutputTemplate, ResourceUrl};
use crate::progress::to_fraction;

/// One row of the `-F` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry {
    /// Opaque code passed back to the tool with `-f`.
    pub code: String,
    /// Container extension, e.g. `mp4`.
    pub extension: String,
    /// Rest of the row, trimmed.
    pub description: String,
}

impl FormatEntry {
    /// Text shown in the format drop-down.
    pub fn label(&self) -> String {
        format!("{} - {} - {}", self.code, self.extension, self.description)
    }
}

/// Everything the runner needs for one download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: ResourceUrl,
    pub format: FormatCode,
    pub output: OutputTemplate,
    /// Process the whole playlist behind the URL instead of a single video.
    pub playlist: bool,
}

/// Identifier handed out by the worker pool.
pub type JobId = u64;

/// Lifecycle of a download. `Running` only ever moves to `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadStatus {
    #[default]
    NotStarted,
    Running,
    Finished,
}

/// Messages sent from a download worker to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// The tool process was spawned.
    Started,
    /// One raw line of combined stdout/stderr.
    Output(String),
    /// A percentage found in the preceding output line.
    Progress(f32),
    /// Terminal event, sent once whatever the exit code.
    Finished,
}

/// Result of a listing that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    Found(Vec<FormatEntry>),
    Empty,
}

impl From<Vec<FormatEntry>> for ListOutcome {
    fn from(formats: Vec<FormatEntry>) -> Self {
        if formats.is_empty() {
            ListOutcome::Empty
        } else {
            ListOutcome::Found(formats)
        }
    }
}

/// Data structure for tracking a download task in the UI
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Worker pool id
    pub id: JobId,
    /// Human-readable title (URL and format)
    pub title: String,
    /// Current status of the download
    pub status: DownloadStatus,
    /// Progress fraction (0.0 to 1.0)
    pub progress: f32,
    /// Last percentage as reported by the tool
    pub percent: Option<f32>,
    /// Append-only log of the tool output
    pub log: String,
}

impl DownloadTask {
    pub fn new(id: JobId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            status: DownloadStatus::NotStarted,
            progress: 0.0,
            percent: None,
            log: String::new(),
        }
    }

    /// Folds one worker event into the row.
    pub fn apply(&mut self, event: JobEvent) {
        if self.status == DownloadStatus::Finished {
            return;
        }
        match event {
            JobEvent::Started => self.status = DownloadStatus::Running,
            JobEvent::Output(line) => {
                self.status = DownloadStatus::Running;
                self.log.push_str(&line);
                self.log.push('\n');
            }
            JobEvent::Progress(percent) => {
                self.status = DownloadStatus::Running;
                self.percent = Some(percent);
                self.progress = to_fraction(percent);
            }
            JobEvent::Finished => {
                self.status = DownloadStatus::Finished;
                self.log.push_str("\nDownload finished.\n");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == DownloadStatus::Finished
    }
}
