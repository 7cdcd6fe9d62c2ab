use once_cell::sync::Lazy;
use regex::Regex;

// `[download]  42.3% of 10.00MiB`
static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3}\.\d)%").expect("percent pattern compiles"));

/// Returns the first `NN.N%` value found in a line of tool output.
///
/// The value is returned as written; callers clamp before drawing.
pub fn parse_progress_from_line(line: &str) -> Option<f32> {
    let caps = PERCENT.captures(line)?;
    caps[1].parse::<f32>().ok()
}

/// Maps a percentage onto the `0.0..=1.0` range a progress bar expects.
pub fn to_fraction(percent: f32) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0)
}
