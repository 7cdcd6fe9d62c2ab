use tracing::{debug, info, warn};

use crate::command::{ResourceUrl, ToolCommand, ToolConfig};
use crate::error::{Error, Result};
use crate::formats::parse_formats;
use crate::model::ListOutcome;

/// Runs `tool -F <url>` and parses the table it prints.
///
/// A non-zero exit yields [`Error::ListingFailed`] carrying stderr; no partial
/// list is ever returned.
pub async fn list_formats(tool: &ToolConfig, url: &ResourceUrl) -> Result<ListOutcome> {
    let cmd = ToolCommand::list_formats(tool, url);
    debug!(program = %tool.program_name(), args = ?cmd.args(), "listing formats");

    let output = cmd
        .to_command()
        .output()
        .await
        .map_err(|source| Error::Spawn {
            program: tool.program_name(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!(%url, status = %output.status, "format listing failed");
        return Err(Error::ListingFailed {
            status: output.status,
            stderr,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let formats = parse_formats(&stdout);
    info!(%url, count = formats.len(), "formats listed");
    Ok(ListOutcome::from(formats))
}
