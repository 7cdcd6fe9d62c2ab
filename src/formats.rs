//! Parsing of the `-F` format table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::FormatEntry;

// `137          mp4        1080p     4628k , avc1.640028, 30fps, video only, 102.75MiB`
static FORMAT_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(\S+)\s+(.+)$").expect("format row pattern compiles"));

/// Parses one table row. Headers, separators and audio-only rows yield `None`.
pub fn parse_format_line(line: &str) -> Option<FormatEntry> {
    let caps = FORMAT_ROW.captures(line)?;
    let description = caps[3].trim();
    if is_audio_only(description) {
        return None;
    }
    Some(FormatEntry {
        code: caps[1].to_string(),
        extension: caps[2].to_string(),
        description: description.to_string(),
    })
}

/// Parses the whole listing output, keeping the order the tool printed.
pub fn parse_formats(text: &str) -> Vec<FormatEntry> {
    text.lines().filter_map(parse_format_line).collect()
}

fn is_audio_only(description: &str) -> bool {
    description.to_lowercase().contains("audio only")
}
