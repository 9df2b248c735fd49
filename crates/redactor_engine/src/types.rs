use std::fmt;

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uploading,
    AwaitingPipeline,
    Fetching,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: Stage,
    /// Poll attempt number while `AwaitingPipeline`.
    pub attempt: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(JobProgress),
    JobCompleted {
        job_id: JobId,
        result: Result<JobOutcome, FailureKind>,
    },
}

/// File handed to the engine for ingestion: raw bytes plus the metadata the
/// browser declared for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: bytes::Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Key the redacted object was read from.
    pub key: String,
    /// Decoded redacted text.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Upload { message: String },
    TimedOut { attempts: u32 },
    Decode { message: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Upload { message } => {
                write!(f, "could not upload the file: {message}")
            }
            FailureKind::TimedOut { attempts } => {
                write!(
                    f,
                    "timed out waiting for the redacted file ({attempts} attempts)"
                )
            }
            FailureKind::Decode { message } => {
                write!(f, "the redacted file could not be read as text: {message}")
            }
        }
    }
}
