//! Error types shared by the lister, the runner and the config loader.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised before or while talking to the download tool.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL field was empty or only whitespace.
    #[error("enter a URL first")]
    EmptyUrl,

    /// The URL would be read by the tool as an option.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The format code contains characters the tool never emits.
    #[error("invalid format code: {code:?}")]
    InvalidFormatCode {
        /// The rejected code.
        code: String,
    },

    /// The output template is empty or lacks a placeholder.
    #[error("invalid output template {template:?}: {reason}")]
    InvalidTemplate {
        /// The rejected template.
        template: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The tool binary could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// `-F` exited with a non-zero status.
    #[error("format listing failed ({status}):\n{stderr}")]
    ListingFailed {
        /// Exit status reported by the tool.
        status: ExitStatus,
        /// Captured standard error.
        stderr: String,
    },

    /// Reading child output failed.
    #[error("IO error reading tool output: {0}")]
    Io(#[from] std::io::Error),

    /// The config file could not be read or parsed.
    #[error("config error in {path}: {message}")]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Parser or IO message.
        message: String,
    },
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;
