//! Front-end plumbing for an external video-download tool (`yt-dlp`).
//!
//! The library lists the formats a URL offers, runs downloads as child
//! processes and turns their output into [`JobEvent`]s. The egui window in
//! `main.rs` is a thin consumer of this crate.

// Typed command-line assembly for the tool
pub mod command;
// Settings from config.toml and the environment
pub mod config;
// Error type shared by all modules
pub mod error;
// `-F` table parsing
pub mod formats;
// Format listing invocation
pub mod lister;
// Data models for formats, jobs and their events
pub mod model;
// Progress parsing utilities
pub mod progress;
// Download invocation and output streaming
pub mod runner;
// Background runtime and job handles
pub mod worker;

pub use command::{FormatCode, OutputTemplate, ResourceUrl, ToolCommand, ToolConfig};
pub use config::{FileConfig, Settings};
pub use error::{Error, Result};
pub use formats::{parse_format_line, parse_formats};
pub use lister::list_formats;
pub use model::{DownloadJob, DownloadStatus, DownloadTask, FormatEntry, JobEvent, JobId, ListOutcome};
pub use progress::parse_progress_from_line;
pub use runner::run_download;
pub use worker::{JobHandle, ListingHandle, Notify, Workers};
