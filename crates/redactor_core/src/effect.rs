#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Upload the file to the ingest bucket and poll for the redacted output.
    StartRedaction {
        job_id: crate::JobId,
        file: crate::SelectedFile,
    },
    /// Revoke a download handle the platform registered earlier.
    ReleaseDownload { handle: crate::DownloadHandle },
}
