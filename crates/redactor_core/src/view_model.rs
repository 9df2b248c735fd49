use crate::{DownloadHandle, Stage};

/// Filename offered for every download, regardless of the original name.
pub const DOWNLOAD_FILE_NAME: &str = "redacted_file.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCardView {
    pub name: String,
    pub size_bytes: u64,
}

/// Render-ready projection of the current phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseView {
    Idle {
        selected: Option<FileCardView>,
        notice: Option<String>,
        can_submit: bool,
    },
    Processing {
        stage_label: &'static str,
    },
    Complete {
        handle: DownloadHandle,
        download_name: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub phase: PhaseView,
    pub dirty: bool,
}

pub(crate) fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Uploading => "Uploading your file",
        Stage::AwaitingPipeline => "Redacting PII, please wait a moment...",
        Stage::Fetching => "Fetching the redacted output",
    }
}
