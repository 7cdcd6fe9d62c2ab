use std::future::Future;
use std::io::{BufRead, BufReader, PipeReader};
use std::thread;

use tokio::process::Child;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use crate::command::{ToolCommand, ToolConfig};
use crate::error::{Error, Result};
use crate::model::{DownloadJob, JobEvent};
use crate::progress::parse_progress_from_line;

/// Runs one download to completion, reporting through `emit`.
///
/// Emits `Started`, then one `Output` per line of combined stdout/stderr
/// (followed by `Progress` when the line carries a percentage), and always
/// ends with exactly one `Finished`. When `cancel` resolves first the child is
/// killed and `Finished` is still sent.
pub async fn run_download<C, F>(tool: &ToolConfig, job: &DownloadJob, cancel: C, mut emit: F)
where
    C: Future<Output = ()>,
    F: FnMut(JobEvent),
{
    let cmd = ToolCommand::download(tool, job);
    info!(url = %job.url, format = %job.format, playlist = job.playlist, "starting download");
    debug!(program = %tool.program_name(), args = ?cmd.args(), "spawning tool");

    let (mut child, output) = match spawn_merged(tool, &cmd) {
        Ok(spawned) => spawned,
        Err(err) => {
            warn!(url = %job.url, %err, "download did not start");
            emit(JobEvent::Output(err.to_string()));
            emit(JobEvent::Finished);
            return;
        }
    };
    emit(JobEvent::Started);

    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let reader = thread::Builder::new()
        .name("ytdlp-output".into())
        .spawn(move || forward_lines(output, line_tx));
    if let Err(err) = reader {
        warn!(url = %job.url, %err, "could not start output reader");
    }

    tokio::pin!(cancel);
    let mut cancelled = false;
    loop {
        tokio::select! {
            line = line_rx.recv() => match line {
                Some(line) => {
                    debug!(url = %job.url, "{line}");
                    let percent = parse_progress_from_line(&line);
                    emit(JobEvent::Output(line));
                    if let Some(percent) = percent {
                        emit(JobEvent::Progress(percent));
                    }
                }
                None => break,
            },
            _ = &mut cancel => {
                cancelled = true;
                break;
            }
        }
    }

    // The tool may close its output and keep running.
    let status = if cancelled {
        None
    } else {
        tokio::select! {
            status = child.wait() => Some(status),
            _ = &mut cancel => None,
        }
    };

    match status {
        Some(Ok(status)) => info!(url = %job.url, %status, "tool exited"),
        Some(Err(err)) => warn!(url = %job.url, %err, "failed to reap tool"),
        None => {
            info!(url = %job.url, "download cancelled");
            if let Err(err) = child.kill().await {
                warn!(url = %job.url, %err, "failed to kill tool");
            }
        }
    }
    emit(JobEvent::Finished);
}

/// Spawns the tool with stdout and stderr on one pipe.
fn spawn_merged(tool: &ToolConfig, cmd: &ToolCommand) -> Result<(Child, PipeReader)> {
    let spawn_err = |source| Error::Spawn {
        program: tool.program_name(),
        source,
    };
    let (mut command, output) = cmd.to_merged_command().map_err(spawn_err)?;
    let child = command.spawn().map_err(spawn_err)?;
    // Releases our copies of the write end.
    drop(command);
    Ok((child, output))
}

/// Pushes every line of the merged output into `tx`. Invalid UTF-8 is
/// replaced rather than ending the stream, so the pipe never fills up unread.
fn forward_lines(output: PipeReader, tx: UnboundedSender<String>) {
    for segment in BufReader::new(output).split(b'\n') {
        match segment {
            Ok(bytes) => {
                let line = String::from_utf8_lossy(&bytes);
                let line = line.trim_end_matches('\r').to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(%err, "error reading tool output");
                break;
            }
        }
    }
}
