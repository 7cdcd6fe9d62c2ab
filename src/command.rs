//! Typed argument assembly for the download tool.
//!
//! Every value that ends up on the tool's command line goes through one of
//! the newtypes below, so a URL or format code can never be read as an option.

use std::ffi::OsString;
use std::fmt;
use std::io::{self, PipeReader};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};
use crate::model::DownloadJob;

const TITLE_PLACEHOLDER: &str = "%(title)s";
const EXT_PLACEHOLDER: &str = "%(ext)s";

/// A non-empty URL that does not look like a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrl(String);

impl ResourceUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = raw.trim();
        if url.is_empty() {
            return Err(Error::EmptyUrl);
        }
        if url.starts_with('-') || url.chars().any(char::is_whitespace) {
            return Err(Error::InvalidUrl {
                url: url.to_string(),
            });
        }
        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A format selector such as `137` or `bestvideo+bestaudio`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCode(String);

impl FormatCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        let allowed = |c: char| c.is_ascii_alphanumeric() || "+/-_[]=<>.".contains(c);
        if code.is_empty() || code.starts_with('-') || !code.chars().all(allowed) {
            return Err(Error::InvalidFormatCode {
                code: raw.to_string(),
            });
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output path with the title and extension placeholders the tool fills in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate(String);

impl OutputTemplate {
    /// `<dir>/%(title)s.%(ext)s`
    pub fn in_dir(dir: &Path) -> Self {
        let template = dir.join(format!("{TITLE_PLACEHOLDER}.{EXT_PLACEHOLDER}"));
        Self(template.to_string_lossy().into_owned())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let reason = if raw.trim().is_empty() {
            Some("template is empty")
        } else if raw.starts_with('-') {
            Some("template looks like an option")
        } else if !raw.contains(TITLE_PLACEHOLDER) {
            Some("missing %(title)s")
        } else if !raw.contains(EXT_PLACEHOLDER) {
            Some("missing %(ext)s")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(Error::InvalidTemplate {
                template: raw.to_string(),
                reason,
            }),
            None => Ok(Self(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How to start the tool: a program plus any arguments that always come first
/// (e.g. `python3 -m yt_dlp`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub program: PathBuf,
    pub base_args: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            base_args: Vec::new(),
        }
    }
}

impl ToolConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// A fully assembled invocation of the tool.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    fn new(tool: &ToolConfig) -> Self {
        Self {
            program: tool.program.clone(),
            args: tool.base_args.iter().map(OsString::from).collect(),
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `tool -F <url>`
    pub fn list_formats(tool: &ToolConfig, url: &ResourceUrl) -> Self {
        Self::new(tool).arg("-F").arg(url.as_str())
    }

    /// `tool -f <code> -o <template> --newline --yes-playlist|--no-playlist <url>`
    pub fn download(tool: &ToolConfig, job: &DownloadJob) -> Self {
        let playlist = if job.playlist {
            "--yes-playlist"
        } else {
            "--no-playlist"
        };
        Self::new(tool)
            .arg("-f")
            .arg(job.format.as_str())
            .arg("-o")
            .arg(job.output.as_str())
            .arg("--newline")
            .arg(playlist)
            .arg(job.url.as_str())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Builds the process with piped output; the child dies with its handle.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Builds the process with stdout and stderr sharing one pipe, so lines
    /// arrive in the order the tool wrote them.
    ///
    /// The returned command holds a write end of the pipe: drop it once the
    /// child is spawned or the reader never sees end of file.
    pub fn to_merged_command(&self) -> io::Result<(Command, PipeReader)> {
        let (reader, writer) = io::pipe()?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .kill_on_drop(true);
        Ok((cmd, reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cmd: &ToolCommand) -> Vec<String> {
        cmd.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn job(playlist: bool) -> DownloadJob {
        DownloadJob {
            url: ResourceUrl::parse("https://youtu.be/abc").unwrap(),
            format: FormatCode::parse("137").unwrap(),
            output: OutputTemplate::parse("/tmp/%(title)s.%(ext)s").unwrap(),
            playlist,
        }
    }

    #[test]
    fn url_is_trimmed_and_checked() {
        assert_eq!(
            ResourceUrl::parse("  https://youtu.be/abc \n").unwrap().as_str(),
            "https://youtu.be/abc"
        );
        assert!(matches!(ResourceUrl::parse("   "), Err(Error::EmptyUrl)));
        assert!(matches!(ResourceUrl::parse(""), Err(Error::EmptyUrl)));
        assert!(matches!(
            ResourceUrl::parse("--exec rm"),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn format_codes() {
        for ok in ["137", "bestvideo+bestaudio", "best[height<=720]", "hls-1080p", "137/22"] {
            assert!(FormatCode::parse(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["", "-x", "137 --exec", "a;b", "$(id)"] {
            assert!(
                matches!(FormatCode::parse(bad), Err(Error::InvalidFormatCode { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn templates() {
        let t = OutputTemplate::in_dir(Path::new("/home/me/Downloads"));
        assert_eq!(t.as_str(), "/home/me/Downloads/%(title)s.%(ext)s");
        assert!(OutputTemplate::parse(t.as_str()).is_ok());
        assert!(OutputTemplate::parse("").is_err());
        assert!(OutputTemplate::parse("-o.%(ext)s").is_err());
        assert!(OutputTemplate::parse("/tmp/video.%(ext)s").is_err());
        assert!(OutputTemplate::parse("/tmp/%(title)s.mp4").is_err());
    }

    #[test]
    fn list_args() {
        let url = ResourceUrl::parse("https://youtu.be/abc").unwrap();
        let cmd = ToolCommand::list_formats(&ToolConfig::default(), &url);
        assert_eq!(cmd.program(), Path::new("yt-dlp"));
        assert_eq!(strings(&cmd), ["-F", "https://youtu.be/abc"]);
    }

    #[test]
    fn download_args() {
        let cmd = ToolCommand::download(&ToolConfig::default(), &job(false));
        assert_eq!(
            strings(&cmd),
            [
                "-f",
                "137",
                "-o",
                "/tmp/%(title)s.%(ext)s",
                "--newline",
                "--no-playlist",
                "https://youtu.be/abc"
            ]
        );
        let cmd = ToolCommand::download(&ToolConfig::default(), &job(true));
        assert_eq!(strings(&cmd)[5], "--yes-playlist");
    }

    #[test]
    fn base_args_come_first() {
        let tool = ToolConfig::new("python3").with_base_args(["-m", "yt_dlp"]);
        let url = ResourceUrl::parse("https://youtu.be/abc").unwrap();
        let cmd = ToolCommand::list_formats(&tool, &url);
        assert_eq!(cmd.program(), Path::new("python3"));
        assert_eq!(strings(&cmd), ["-m", "yt_dlp", "-F", "https://youtu.be/abc"]);
    }
}
