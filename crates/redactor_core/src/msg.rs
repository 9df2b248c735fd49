#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file via drag-and-drop or the browse dialog.
    FileSelected(crate::SelectedFile),
    /// User removed the current selection.
    FileCleared,
    /// User submitted the selected file for redaction.
    RedactClicked,
    /// Engine progress for the in-flight job.
    JobProgress {
        job_id: crate::JobId,
        stage: crate::Stage,
    },
    /// The job finished and the platform registered its result for download.
    JobSucceeded {
        job_id: crate::JobId,
        handle: crate::DownloadHandle,
    },
    /// The job gave up; `message` is shown to the user.
    JobFailed { job_id: crate::JobId, message: String },
    /// User discarded the completed result.
    ResetClicked,
    /// Fallback for placeholder wiring.
    NoOp,
}
