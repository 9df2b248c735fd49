use std::time::Duration;

use redactor_logging::redact_debug;

use crate::body::{decode_text, DecodeError};
use crate::store::{ObjectStore, StoreError};
use crate::types::{EngineEvent, JobId, JobProgress, Stage};
use crate::upload::KEY_PREFIX;

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Key the external pipeline writes its output under, derived purely from
/// the original filename.
pub fn redacted_key(file_name: &str) -> String {
    format!("{KEY_PREFIX}redacted_{file_name}")
}

/// Delay before each retry: starts at `initial_delay`, doubles after every
/// miss, capped at `max_delay`. No jitter.
pub fn backoff_delays(settings: &PollSettings) -> impl Iterator<Item = Duration> {
    let max_delay = settings.max_delay;
    std::iter::successors(Some(settings.initial_delay.min(max_delay)), move |delay| {
        Some(delay.saturating_mul(2).min(max_delay))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("timed out waiting for the redacted file ({attempts} attempts)")]
    TimedOut { attempts: u32 },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedOutput {
    pub key: String,
    pub text: String,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum ProbeError {
    Store(StoreError),
    Decode(DecodeError),
}

/// Wait for the redacted counterpart of `file_name` to appear in the output
/// bucket, then fetch and decode it.
///
/// At most `settings.max_attempts` existence checks are issued. An absent
/// object and a transient service error look the same from here; both wait
/// out the next backoff delay. A decode failure is terminal: the bytes will
/// not change on a refetch.
pub async fn wait_for_redacted(
    store: &dyn ObjectStore,
    job_id: JobId,
    file_name: &str,
    settings: &PollSettings,
    sink: &dyn ProgressSink,
) -> Result<RedactedOutput, PollError> {
    let key = redacted_key(file_name);
    let mut delays = backoff_delays(settings);

    for attempt in 1..=settings.max_attempts {
        sink.emit(EngineEvent::Progress(JobProgress {
            job_id,
            stage: Stage::AwaitingPipeline,
            attempt: Some(attempt),
        }));

        match probe(store, job_id, &key, sink).await {
            Ok(Some(text)) => return Ok(RedactedOutput { key, text }),
            Ok(None) => {}
            Err(ProbeError::Decode(err)) => return Err(PollError::Decode(err)),
            Err(ProbeError::Store(err)) => {
                redact_debug!("job {job_id}: poll attempt {attempt} for {key} failed: {err}");
            }
        }

        if attempt < settings.max_attempts {
            if let Some(delay) = delays.next() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    Err(PollError::TimedOut {
        attempts: settings.max_attempts,
    })
}

/// One existence check, followed by fetch and decode when the object is
/// there. `Ok(None)` means confirmed absent.
async fn probe(
    store: &dyn ObjectStore,
    job_id: JobId,
    key: &str,
    sink: &dyn ProgressSink,
) -> Result<Option<String>, ProbeError> {
    if !store.head(key).await.map_err(ProbeError::Store)? {
        return Ok(None);
    }

    sink.emit(EngineEvent::Progress(JobProgress {
        job_id,
        stage: Stage::Fetching,
        attempt: None,
    }));

    let body = store.get(key).await.map_err(ProbeError::Store)?;
    let text = decode_text(body).await.map_err(ProbeError::Decode)?;
    Ok(Some(text))
}
