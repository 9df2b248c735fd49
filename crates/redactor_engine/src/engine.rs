use std::sync::{mpsc, Arc};
use std::thread;

use redactor_logging::redact_info;

use crate::poll::{wait_for_redacted, ChannelProgressSink, PollError, PollSettings, ProgressSink};
use crate::store::ObjectStore;
use crate::types::{EngineEvent, FailureKind, IngestFile, JobId, JobOutcome, JobProgress, Stage};
use crate::upload::upload_to_ingest;

enum EngineCommand {
    StartJob { job_id: JobId, file: IngestFile },
}

/// The two buckets the engine works against: originals in, redacted out.
#[derive(Clone)]
pub struct JobStores {
    pub ingest: Arc<dyn ObjectStore>,
    pub output: Arc<dyn ObjectStore>,
}

/// Handle to the engine's runtime thread. Commands go in over a channel;
/// events for every job come back on the receiver returned by [`new`].
///
/// [`new`]: EngineHandle::new
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        stores: JobStores,
        settings: PollSettings,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let stores = stores.clone();
                let settings = settings.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(stores, settings, command, event_tx).await;
                });
            }
        });

        (Self { cmd_tx }, event_rx)
    }

    pub fn start_job(&self, job_id: JobId, file: IngestFile) {
        let _ = self.cmd_tx.send(EngineCommand::StartJob { job_id, file });
    }
}

async fn handle_command(
    stores: JobStores,
    settings: PollSettings,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::StartJob { job_id, file } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = run_job(&stores, &settings, job_id, &file, &sink).await;
            let _ = event_tx.send(EngineEvent::JobCompleted { job_id, result });
        }
    }
}

/// Upload, then poll. Strictly sequential: polling only starts once the
/// ingest object is fully written.
async fn run_job(
    stores: &JobStores,
    settings: &PollSettings,
    job_id: JobId,
    file: &IngestFile,
    sink: &dyn ProgressSink,
) -> Result<JobOutcome, FailureKind> {
    sink.emit(EngineEvent::Progress(JobProgress {
        job_id,
        stage: Stage::Uploading,
        attempt: None,
    }));

    let receipt = upload_to_ingest(stores.ingest.as_ref(), file)
        .await
        .map_err(|err| FailureKind::Upload {
            message: err.to_string(),
        })?;
    redact_info!(
        "job {job_id}: uploaded {byte_len} bytes as {key}",
        byte_len = file.bytes.len(),
        key = receipt.key
    );

    let output = wait_for_redacted(
        stores.output.as_ref(),
        job_id,
        &receipt.file_name,
        settings,
        sink,
    )
    .await
    .map_err(|err| match err {
        PollError::TimedOut { attempts } => FailureKind::TimedOut { attempts },
        PollError::Decode(decode) => FailureKind::Decode {
            message: decode.to_string(),
        },
    })?;
    redact_info!("job {job_id}: redacted output ready at {key}", key = output.key);

    sink.emit(EngineEvent::Progress(JobProgress {
        job_id,
        stage: Stage::Done,
        attempt: None,
    }));

    Ok(JobOutcome {
        key: output.key,
        text: output.text,
    })
}
