use crate::view_model::{stage_label, AppViewModel, FileCardView, PhaseView};

pub type JobId = u64;

/// Opaque reference to downloadable content the platform holds in memory.
/// Minted when a job completes; revoked via `Effect::ReleaseDownload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DownloadHandle(pub u64);

/// The file the user picked, exactly as the browser declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Pipeline stage of the in-flight job, mirrored from the engine for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uploading,
    AwaitingPipeline,
    Fetching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Processing { job_id: JobId, stage: Stage },
    Complete { handle: DownloadHandle },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    phase: Phase,
    selected_file: Option<SelectedFile>,
    notice: Option<String>,
    next_job_id: JobId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            selected_file: None,
            notice: None,
            next_job_id: 1,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        let phase = match &self.phase {
            Phase::Idle => PhaseView::Idle {
                selected: self.selected_file.as_ref().map(|file| FileCardView {
                    name: file.name.clone(),
                    size_bytes: file.bytes.len() as u64,
                }),
                notice: self.notice.clone(),
                can_submit: self.selected_file.is_some(),
            },
            Phase::Processing { stage, .. } => PhaseView::Processing {
                stage_label: stage_label(*stage),
            },
            Phase::Complete { handle } => PhaseView::Complete {
                handle: *handle,
                download_name: crate::view_model::DOWNLOAD_FILE_NAME,
            },
        };
        AppViewModel {
            phase,
            dirty: self.dirty,
        }
    }

    /// Returns whether state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select_file(&mut self, file: SelectedFile) {
        self.selected_file = Some(file);
        self.notice = None;
        self.mark_dirty();
    }

    pub(crate) fn clear_file(&mut self) {
        if self.selected_file.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_job(&mut self) -> JobId {
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        self.phase = Phase::Processing {
            job_id,
            stage: Stage::Uploading,
        };
        self.notice = None;
        self.mark_dirty();
        job_id
    }

    pub(crate) fn apply_progress(&mut self, job_id: JobId, stage: Stage) {
        if let Phase::Processing {
            job_id: current,
            stage: current_stage,
        } = &mut self.phase
        {
            if *current == job_id && *current_stage != stage {
                *current_stage = stage;
                self.mark_dirty();
            }
        }
    }

    /// Moves to `Complete` if `job_id` is the in-flight job. Returns whether
    /// the completion was accepted; a stale completion leaves state alone.
    pub(crate) fn complete_job(&mut self, job_id: JobId, handle: DownloadHandle) -> bool {
        match self.phase {
            Phase::Processing {
                job_id: current, ..
            } if current == job_id => {
                self.phase = Phase::Complete { handle };
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    /// Returns to `Idle` with a visible notice if `job_id` is the in-flight
    /// job. The selection is kept so the user can resubmit.
    pub(crate) fn fail_job(&mut self, job_id: JobId, message: String) -> bool {
        match self.phase {
            Phase::Processing {
                job_id: current, ..
            } if current == job_id => {
                self.phase = Phase::Idle;
                self.notice = Some(message);
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    /// Discards a completed result: clears the selection and notice and hands
    /// back the download handle so the platform can revoke it.
    pub(crate) fn reset(&mut self) -> Option<DownloadHandle> {
        match self.phase {
            Phase::Complete { handle } => {
                self.phase = Phase::Idle;
                self.selected_file = None;
                self.notice = None;
                self.mark_dirty();
                Some(handle)
            }
            _ => None,
        }
    }
}
