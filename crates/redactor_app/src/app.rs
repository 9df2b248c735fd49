use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use redactor_core::{update, AppState, AppViewModel, DownloadHandle, Effect, Msg, SelectedFile};
use redactor_engine::{EngineEvent, EngineHandle, IngestFile, JobStores, PollSettings};
use redactor_logging::{redact_info, redact_warn};

use crate::download::DownloadRegistry;

/// The wired application: the state machine, the engine, and the download
/// registry. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    state: Mutex<AppState>,
    engine: EngineHandle,
    downloads: DownloadRegistry,
}

impl App {
    /// Wire the app against explicitly constructed stores. The engine event
    /// pump starts immediately.
    pub fn new(stores: JobStores, poll: PollSettings) -> Self {
        let (engine, event_rx) = EngineHandle::new(stores, poll);
        let app = Self {
            inner: Arc::new(AppInner {
                state: Mutex::new(AppState::new()),
                engine,
                downloads: DownloadRegistry::new(),
            }),
        };
        app.spawn_event_pump(event_rx);
        app
    }

    /// Apply a message through the pure update function, execute the
    /// resulting effects, and return the fresh view model.
    pub fn dispatch(&self, msg: Msg) -> AppViewModel {
        let (view, effects) = {
            let mut guard = self.inner.state.lock().expect("lock app state");
            let state = std::mem::take(&mut *guard);
            let (mut state, effects) = update(state, msg);
            let view = state.view();
            let _ = state.consume_dirty();
            *guard = state;
            (view, effects)
        };
        self.run_effects(effects);
        view
    }

    pub fn view(&self) -> AppViewModel {
        self.inner.state.lock().expect("lock app state").view()
    }

    pub fn download_text(&self, handle: DownloadHandle) -> Option<String> {
        self.inner.downloads.get(handle)
    }

    fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartRedaction { job_id, file } => {
                    redact_info!(
                        "job {job_id}: starting redaction of {name} ({len} bytes)",
                        name = file.name,
                        len = file.bytes.len()
                    );
                    self.inner.engine.start_job(job_id, to_ingest_file(file));
                }
                Effect::ReleaseDownload { handle } => {
                    self.inner.downloads.release(handle);
                }
            }
        }
    }

    fn spawn_event_pump(&self, event_rx: mpsc::Receiver<EngineEvent>) {
        let app = self.clone();
        thread::spawn(move || {
            while let Ok(event) = event_rx.recv() {
                app.apply_engine_event(event);
            }
        });
    }

    fn apply_engine_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::Progress(progress) => {
                if let Some(stage) = map_stage(progress.stage) {
                    self.dispatch(Msg::JobProgress {
                        job_id: progress.job_id,
                        stage,
                    });
                }
            }
            EngineEvent::JobCompleted { job_id, result } => match result {
                Ok(outcome) => {
                    // Mint the handle first; the update function revokes it
                    // again if the completion turns out to be stale.
                    let handle = self.inner.downloads.insert(outcome.text);
                    self.dispatch(Msg::JobSucceeded { job_id, handle });
                }
                Err(failure) => {
                    redact_warn!("job {job_id} failed: {failure}");
                    self.dispatch(Msg::JobFailed {
                        job_id,
                        message: failure.to_string(),
                    });
                }
            },
        }
    }
}

fn to_ingest_file(file: SelectedFile) -> IngestFile {
    IngestFile {
        name: file.name,
        content_type: file.content_type,
        bytes: file.bytes.into(),
    }
}

fn map_stage(stage: redactor_engine::Stage) -> Option<redactor_core::Stage> {
    match stage {
        redactor_engine::Stage::Uploading => Some(redactor_core::Stage::Uploading),
        redactor_engine::Stage::AwaitingPipeline => Some(redactor_core::Stage::AwaitingPipeline),
        redactor_engine::Stage::Fetching => Some(redactor_core::Stage::Fetching),
        // Completion is reported separately; nothing to display for it.
        redactor_engine::Stage::Done => None,
    }
}
