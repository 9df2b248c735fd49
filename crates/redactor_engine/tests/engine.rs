use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use redactor_engine::{
    decode_text, EngineEvent, EngineHandle, FailureKind, IngestFile, JobStores, ObjectBody,
    ObjectStore, OpendalStore, PollSettings, Stage, StoreError,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

fn fast_settings() -> PollSettings {
    PollSettings {
        max_attempts: 10,
        initial_delay: Duration::from_millis(2),
        max_delay: Duration::from_millis(8),
    }
}

fn report_txt() -> IngestFile {
    IngestFile {
        name: "report.txt".to_string(),
        content_type: Some("text/plain".to_string()),
        bytes: Bytes::from_static(b"Alice SSN 123-45-6789"),
    }
}

fn memory_stores() -> (JobStores, Arc<dyn ObjectStore>, Arc<dyn ObjectStore>) {
    let ingest: Arc<dyn ObjectStore> = Arc::new(OpendalStore::memory().expect("memory store"));
    let output: Arc<dyn ObjectStore> = Arc::new(OpendalStore::memory().expect("memory store"));
    (
        JobStores {
            ingest: ingest.clone(),
            output: output.clone(),
        },
        ingest,
        output,
    )
}

/// Collect events until the job completes; panics if it never does.
fn drain_until_completed(
    events: &std::sync::mpsc::Receiver<EngineEvent>,
) -> (Vec<EngineEvent>, Result<redactor_engine::JobOutcome, FailureKind>) {
    let mut seen = Vec::new();
    loop {
        let event = events.recv_timeout(RECV_TIMEOUT).expect("engine event");
        if let EngineEvent::JobCompleted { result, .. } = &event {
            let result = result.clone();
            seen.push(event);
            return (seen, result);
        }
        seen.push(event);
    }
}

#[test]
fn engine_runs_a_job_end_to_end() {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let (stores, ingest, output) = memory_stores();

    // Play the external pipeline: the redacted output is already in place
    // before the job starts, so the first poll attempt hits.
    runtime
        .block_on(output.put(
            "text/redacted_report.txt",
            Bytes::from_static(b"Alice SSN [REDACTED]"),
            "text/plain",
        ))
        .expect("seed output");

    let (engine, events) = EngineHandle::new(stores, fast_settings());
    engine.start_job(7, report_txt());

    let (seen, result) = drain_until_completed(&events);
    let outcome = result.expect("job ok");
    assert_eq!(outcome.key, "text/redacted_report.txt");
    assert_eq!(outcome.text, "Alice SSN [REDACTED]");

    // The original bytes went up unmodified, under the agreed key.
    let body = runtime
        .block_on(ingest.get("text/report.txt"))
        .expect("ingest object");
    let uploaded = runtime.block_on(decode_text(body)).expect("decode");
    assert_eq!(uploaded, "Alice SSN 123-45-6789");

    // Upload strictly precedes polling.
    let stages: Vec<Stage> = seen
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Progress(progress) => Some(progress.stage),
            EngineEvent::JobCompleted { .. } => None,
        })
        .collect();
    assert_eq!(stages.first(), Some(&Stage::Uploading));
    assert!(stages.contains(&Stage::AwaitingPipeline));
    assert_eq!(stages.last(), Some(&Stage::Done));
}

#[test]
fn engine_reports_timeout_when_output_never_appears() {
    let (stores, _ingest, _output) = memory_stores();

    let (engine, events) = EngineHandle::new(stores, fast_settings());
    engine.start_job(8, report_txt());

    let (_seen, result) = drain_until_completed(&events);
    assert_eq!(result.unwrap_err(), FailureKind::TimedOut { attempts: 10 });
}

/// Ingest store that refuses every write.
struct BrokenIngest;

#[async_trait]
impl ObjectStore for BrokenIngest {
    async fn put(&self, _key: &str, _bytes: Bytes, _content_type: &str) -> Result<(), StoreError> {
        Err(StoreError::Service("access denied".to_string()))
    }

    async fn head(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn get(&self, key: &str) -> Result<ObjectBody, StoreError> {
        Err(StoreError::NotFound {
            key: key.to_string(),
        })
    }
}

#[test]
fn engine_reports_upload_failure_without_polling() {
    let (_, _, output) = memory_stores();
    let stores = JobStores {
        ingest: Arc::new(BrokenIngest),
        output,
    };

    let (engine, events) = EngineHandle::new(stores, fast_settings());
    engine.start_job(9, report_txt());

    let (seen, result) = drain_until_completed(&events);
    assert!(matches!(
        result.unwrap_err(),
        FailureKind::Upload { .. }
    ));
    // No poll attempt is made when the upload already failed.
    assert!(seen.iter().all(|event| !matches!(
        event,
        EngineEvent::Progress(progress) if progress.stage == Stage::AwaitingPipeline
    )));
}
