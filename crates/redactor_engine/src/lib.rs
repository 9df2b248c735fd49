//! Redactor engine: object-storage IO pipeline and effect execution.
mod body;
mod engine;
mod poll;
mod store;
mod types;
mod upload;

pub use body::{decode_text, DecodeError, ObjectBody};
pub use engine::{EngineHandle, JobStores};
pub use poll::{
    backoff_delays, redacted_key, wait_for_redacted, ChannelProgressSink, PollError, PollSettings,
    ProgressSink, RedactedOutput,
};
pub use store::{open_store, ObjectStore, OpendalStore, StorageConfig, StoreError};
pub use types::{
    EngineEvent, FailureKind, IngestFile, JobId, JobOutcome, JobProgress, Stage,
};
pub use upload::{ingest_key, upload_to_ingest, UploadReceipt, DEFAULT_CONTENT_TYPE, KEY_PREFIX};
