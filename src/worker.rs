//! Background workers for listings and downloads.
//!
//! The UI thread owns a [`Workers`] and the handles it returns. Workers never
//! touch UI state: everything they produce travels over a per-job channel that
//! the UI drains once per frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::sync::oneshot;
use tracing::debug;

use crate::command::{ResourceUrl, ToolConfig};
use crate::error::{Error, Result};
use crate::lister::list_formats;
use crate::model::{DownloadJob, JobEvent, JobId, ListOutcome};
use crate::runner::run_download;

/// Called after a worker has queued something for the UI.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Owns the runtime every listing and download task runs on.
pub struct Workers {
    runtime: Runtime,
    tool: ToolConfig,
    notify: Notify,
    next_id: AtomicU64,
}

impl Workers {
    pub fn new(tool: ToolConfig, notify: Notify) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("ytdlp-worker")
            .build()?;
        Ok(Self {
            runtime,
            tool,
            notify,
            next_id: AtomicU64::new(1),
        })
    }

    /// Starts `-F` for `url` in the background.
    pub fn list_formats(&self, url: ResourceUrl) -> ListingHandle {
        let (tx, rx) = oneshot::channel();
        let tool = self.tool.clone();
        let notify = Arc::clone(&self.notify);
        self.runtime.spawn(async move {
            let result = list_formats(&tool, &url).await;
            let _ = tx.send(result);
            notify();
        });
        ListingHandle { rx }
    }

    /// Starts a download in the background and returns its handle.
    pub fn download(&self, job: DownloadJob) -> JobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (event_tx, events) = unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let tool = self.tool.clone();
        let notify = Arc::clone(&self.notify);
        debug!(id, url = %job.url, "queueing download");

        self.runtime.spawn(async move {
            // A dropped sender counts as cancellation too.
            let cancel = async move {
                let _ = cancel_rx.await;
            };
            run_download(&tool, &job, cancel, |event| {
                let _ = event_tx.send(event);
                notify();
            })
            .await;
        });

        JobHandle {
            id,
            events,
            cancel: Some(cancel_tx),
        }
    }

    /// Stops the runtime without waiting for running tasks; their children are
    /// killed as the tasks are dropped.
    pub fn shutdown(self) {
        self.runtime.shutdown_background();
    }
}

/// Pending result of a background listing.
pub struct ListingHandle {
    rx: oneshot::Receiver<Result<ListOutcome>>,
}

impl ListingHandle {
    /// Non-blocking poll. `None` while the listing is still running.
    pub fn try_take(&mut self) -> Option<Result<ListOutcome>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(Error::Io(
                std::io::Error::other("listing worker stopped"),
            ))),
        }
    }
}

/// One running download as seen from the UI thread.
pub struct JobHandle {
    id: JobId,
    events: UnboundedReceiver<JobEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Drains every event queued so far without blocking.
    pub fn drain(&mut self) -> Vec<JobEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Kills the child process. The job still ends with `Finished`.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}
