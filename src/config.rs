//! Settings loaded from `config.toml` and the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::ToolConfig;
use crate::error::{Error, Result};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "YTDLP_FRONTEND_CONFIG";
/// Overrides the tool program.
pub const TOOL_ENV: &str = "YTDLP_FRONTEND_TOOL";

const CONFIG_FILE: &str = "config.toml";

/// On-disk shape of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Program to run, e.g. `yt-dlp` or `/usr/local/bin/yt-dlp`.
    pub tool: Option<String>,
    /// Arguments placed before every invocation.
    pub tool_args: Vec<String>,
    /// Folder downloads are written to.
    pub output_dir: Option<PathBuf>,
    /// Download whole playlists by default.
    pub playlist: Option<bool>,
}

impl FileConfig {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Reads `path`; a missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(path, &text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                Ok(Self::default())
            }
            Err(err) => Err(Error::Config {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let to_config_err = |message: String| Error::Config {
            path: path.to_path_buf(),
            message,
        };
        let text = toml::to_string_pretty(self).map_err(|err| to_config_err(err.to_string()))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|err| to_config_err(err.to_string()))?;
        }
        fs::write(path, text).map_err(|err| to_config_err(err.to_string()))
    }
}

/// Resolved settings the application runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tool: ToolConfig,
    pub output_dir: PathBuf,
    pub playlist: bool,
    /// Where these settings were read from and get saved to.
    pub path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool: ToolConfig::default(),
            output_dir: default_output_dir(),
            playlist: false,
            path: None,
        }
    }
}

impl Settings {
    /// Defaults, then the config file, then the environment.
    pub fn load() -> Result<Self> {
        let path = config_path();
        let file = match &path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let mut settings = Self::from_file(file, env::var(TOOL_ENV).ok());
        settings.path = path;
        Ok(settings)
    }

    pub fn from_file(file: FileConfig, tool_override: Option<String>) -> Self {
        let defaults = Self::default();
        let program = tool_override
            .filter(|tool| !tool.trim().is_empty())
            .or(file.tool)
            .map(PathBuf::from)
            .unwrap_or(defaults.tool.program);
        Self {
            tool: ToolConfig::new(program).with_base_args(file.tool_args),
            output_dir: file.output_dir.unwrap_or(defaults.output_dir),
            playlist: file.playlist.unwrap_or(defaults.playlist),
            path: None,
        }
    }

    /// Writes the user-adjustable fields back, keeping the tool settings.
    pub fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let file = FileConfig {
            tool: Some(self.tool.program_name()),
            tool_args: self.tool.base_args.clone(),
            output_dir: Some(self.output_dir.clone()),
            playlist: Some(self.playlist),
        };
        if let Err(err) = file.save(path) {
            warn!(%err, "could not save settings");
        }
    }
}

/// `$YTDLP_FRONTEND_CONFIG`, else `<platform config dir>/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("org", "example", "ytdlp-frontend")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn default_output_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("./downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let file = FileConfig::from_toml(Path::new("c.toml"), "").unwrap();
        let settings = Settings::from_file(file, None);
        assert_eq!(settings.tool, ToolConfig::default());
        assert!(!settings.playlist);
        assert_eq!(settings.output_dir, default_output_dir());
    }

    #[test]
    fn file_values_apply() {
        let text = r#"
tool = "python3"
tool_args = ["-m", "yt_dlp"]
output_dir = "/srv/videos"
playlist = true
"#;
        let file = FileConfig::from_toml(Path::new("c.toml"), text).unwrap();
        let settings = Settings::from_file(file, None);
        assert_eq!(settings.tool.program, PathBuf::from("python3"));
        assert_eq!(settings.tool.base_args, ["-m", "yt_dlp"]);
        assert_eq!(settings.output_dir, PathBuf::from("/srv/videos"));
        assert!(settings.playlist);
    }

    #[test]
    fn env_tool_wins_unless_blank() {
        let file = FileConfig {
            tool: Some("from-file".into()),
            ..FileConfig::default()
        };
        let settings = Settings::from_file(file.clone(), Some("from-env".into()));
        assert_eq!(settings.tool.program, PathBuf::from("from-env"));
        let settings = Settings::from_file(file, Some("  ".into()));
        assert_eq!(settings.tool.program, PathBuf::from("from-file"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FileConfig::from_toml(Path::new("c.toml"), "colour = 1").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn missing_file_is_empty_and_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(FileConfig::load(&path).unwrap(), FileConfig::default());

        let settings = Settings {
            tool: ToolConfig::new("yt-dlp"),
            output_dir: PathBuf::from("/tmp/out"),
            playlist: true,
            path: Some(path.clone()),
        };
        settings.save();
        let loaded = Settings::from_file(FileConfig::load(&path).unwrap(), None);
        assert_eq!(loaded.output_dir, PathBuf::from("/tmp/out"));
        assert!(loaded.playlist);
    }
}
