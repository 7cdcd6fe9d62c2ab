//! Main application for the yt-dlp front-end GUI

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::Visuals;
// OnceCell so workers can wake the UI once it exists
use once_cell::sync::OnceCell;
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ytdlp_frontend::{
    DownloadJob, DownloadTask, Error, FormatCode, FormatEntry, JobHandle, JobId, ListOutcome,
    ListingHandle, OutputTemplate, ResourceUrl, Settings, Workers,
};

// egui context, set once the window has been created
static UI_CTX: OnceCell<egui::Context> = OnceCell::new();

/// Program entry point: initializes logging and settings, then launches the GUI
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::load().context("loading settings")?;
    info!(tool = %settings.tool.program_name(), output = %settings.output_dir.display(), "starting");

    // Workers repaint the window whenever they queue an event
    let workers = Workers::new(
        settings.tool.clone(),
        Arc::new(|| {
            if let Some(ctx) = UI_CTX.get() {
                ctx.request_repaint();
            }
        }),
    )
    .context("starting worker runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([760.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "yt-dlp Downloader",
        options,
        Box::new(move |cc| {
            // Use dark theme visuals
            cc.egui_ctx.set_visuals(Visuals::dark());
            let _ = UI_CTX.set(cc.egui_ctx.clone());
            Box::new(DownloaderApp::new(settings, workers))
        }),
    )
    .map_err(|err| anyhow!("window closed with error: {err}"))
}

/// Application state for the GUI
struct DownloaderApp {
    /// Input field for the video URL
    url_input: String,
    /// Output folder, playlist flag and tool
    settings: Settings,
    /// Formats from the last successful listing
    formats: Vec<FormatEntry>,
    /// Index into `formats`
    selected_format: usize,
    /// Listing in flight, if any
    listing: Option<ListingHandle>,
    /// Window-level messages
    log: String,
    /// One row per download
    downloads: Vec<DownloadTask>,
    /// Event channels for each download row
    jobs: HashMap<JobId, JobHandle>,
    /// Background runtime; dropped last so children die with the window
    workers: Workers,
}

impl DownloaderApp {
    fn new(settings: Settings, workers: Workers) -> Self {
        Self {
            url_input: String::new(),
            settings,
            formats: Vec::new(),
            selected_format: 0,
            listing: None,
            log: String::new(),
            downloads: Vec::new(),
            jobs: HashMap::new(),
            workers,
        }
    }

    fn append_log(&mut self, text: impl AsRef<str>) {
        self.log.push_str(text.as_ref());
    }

    fn fetch_formats(&mut self) {
        let url = match ResourceUrl::parse(&self.url_input) {
            Ok(url) => url,
            Err(Error::EmptyUrl) => {
                self.append_log("Enter a URL before fetching formats.\n");
                return;
            }
            Err(err) => {
                self.append_log(format!("{err}\n"));
                return;
            }
        };
        self.append_log("Fetching formats...\n");
        self.formats.clear();
        self.selected_format = 0;
        self.listing = Some(self.workers.list_formats(url));
    }

    fn poll_listing(&mut self) {
        let Some(listing) = self.listing.as_mut() else {
            return;
        };
        let Some(result) = listing.try_take() else {
            return;
        };
        self.listing = None;

        match result {
            Ok(ListOutcome::Found(formats)) => {
                self.append_log(format!("Found {} video formats.\n", formats.len()));
                self.formats = formats;
                self.selected_format = 0;
            }
            Ok(ListOutcome::Empty) => self.append_log("No formats found.\n"),
            Err(Error::ListingFailed { stderr, .. }) => {
                self.append_log(format!("Failed to fetch formats:\n{stderr}\n"));
            }
            Err(err) => {
                warn!(%err, "format listing did not run");
                self.append_log(format!("Failed to fetch formats:\n{err}\n"));
            }
        }
    }

    fn start_download(&mut self) {
        let url = match ResourceUrl::parse(&self.url_input) {
            Ok(url) => url,
            Err(_) => {
                self.append_log("Please enter a valid URL.\n");
                return;
            }
        };
        let Some(entry) = self.formats.get(self.selected_format) else {
            self.append_log("Please fetch and select a format first.\n");
            return;
        };
        let format = match FormatCode::parse(&entry.code) {
            Ok(format) => format,
            Err(err) => {
                self.append_log(format!("{err}\n"));
                return;
            }
        };

        let job = DownloadJob {
            url,
            format,
            output: OutputTemplate::in_dir(&self.settings.output_dir),
            playlist: self.settings.playlist,
        };
        self.append_log(format!("Starting download: format {}\n", job.format));
        let title = format!("{} [{}]", job.url, job.format);

        let handle = self.workers.download(job);
        self.downloads.push(DownloadTask::new(handle.id(), title));
        self.jobs.insert(handle.id(), handle);
    }

    /// Moves queued worker events into their rows
    fn poll_jobs(&mut self) {
        for task in &mut self.downloads {
            if let Some(handle) = self.jobs.get_mut(&task.id) {
                for event in handle.drain() {
                    task.apply(event);
                }
            }
        }
    }

    fn choose_folder(&mut self) {
        if let Some(folder) = FileDialog::new()
            .set_directory(&self.settings.output_dir)
            .pick_folder()
        {
            self.settings.output_dir = folder;
            self.settings.save();
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // 1️⃣ Drain worker channels
        self.poll_listing();
        self.poll_jobs();

        // 2️⃣ Right-side panel: one row per download
        egui::SidePanel::right("downloads_panel")
            .min_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Downloads");
                ui.separator();

                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        let mut to_remove = vec![];

                        for task in &self.downloads {
                            ui.group(|ui| {
                                ui.label(&task.title);
                                let mut bar = egui::ProgressBar::new(task.progress);
                                if let Some(percent) = task.percent {
                                    bar = bar.text(format!("{percent:.1}%"));
                                }
                                ui.add(bar);

                                egui::CollapsingHeader::new("Log")
                                    .id_source(("job_log", task.id))
                                    .show(ui, |ui| {
                                        egui::ScrollArea::vertical()
                                            .id_source(("job_scroll", task.id))
                                            .max_height(160.0)
                                            .stick_to_bottom(true)
                                            .show(ui, |ui| {
                                                ui.label(egui::RichText::new(&task.log).monospace());
                                            });
                                    });

                                ui.horizontal(|ui| {
                                    if task.is_finished() {
                                        ui.label("✅ Finished");
                                        if ui.button("Remove").clicked() {
                                            to_remove.push(task.id);
                                        }
                                    } else {
                                        ui.label("⬇️ Downloading");
                                        if ui.button("Cancel").clicked() {
                                            if let Some(handle) = self.jobs.get_mut(&task.id) {
                                                handle.cancel();
                                            }
                                        }
                                    }
                                });
                            });
                        }

                        // Remove rows and their channels after iteration
                        if !to_remove.is_empty() {
                            self.downloads.retain(|t| !to_remove.contains(&t.id));
                            for id in to_remove {
                                self.jobs.remove(&id);
                            }
                        }
                    });
            });

        // 3️⃣ Main panel: URL, formats, folder and buttons
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("yt-dlp Downloader");

            ui.label("Video URL:");
            ui.add(
                egui::TextEdit::singleline(&mut self.url_input)
                    .hint_text("Enter YouTube URL")
                    .desired_width(f32::INFINITY),
            );

            let idle = self.listing.is_none();
            if ui
                .add_enabled(idle, egui::Button::new("Fetch Formats"))
                .clicked()
            {
                self.fetch_formats();
            }

            ui.label("Select format:");
            let selected_text = self
                .formats
                .get(self.selected_format)
                .map(FormatEntry::label)
                .unwrap_or_default();
            ui.add_enabled_ui(!self.formats.is_empty(), |ui| {
                egui::ComboBox::from_id_source("format_combo")
                    .width(ui.available_width())
                    .selected_text(selected_text)
                    .show_ui(ui, |ui| {
                        for (index, format) in self.formats.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_format, index, format.label());
                        }
                    });
            });

            ui.horizontal(|ui| {
                let label = format!("Output folder: {}", self.settings.output_dir.display());
                if ui.button(label).clicked() {
                    self.choose_folder();
                }
            });

            if ui
                .checkbox(&mut self.settings.playlist, "Download whole playlist")
                .changed()
            {
                self.settings.save();
            }

            ui.separator();
            egui::ScrollArea::vertical()
                .id_source("window_log")
                .max_height((ui.available_height() - 40.0).max(60.0))
                .auto_shrink([false; 2])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(&self.log).monospace());
                });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Close").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                let can_download = idle && !self.formats.is_empty();
                if ui
                    .add_enabled(can_download, egui::Button::new("Download"))
                    .clicked()
                {
                    self.start_download();
                }
            });
        });

        // Request periodic repaint for progress updates
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
