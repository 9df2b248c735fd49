use crate::{AppState, Effect, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            // Selection only makes sense while idle; the picker is not
            // rendered in the other phases, so anything else is stale input.
            if matches!(state.phase(), Phase::Idle) {
                state.select_file(file);
            }
            Vec::new()
        }
        Msg::FileCleared => {
            if matches!(state.phase(), Phase::Idle) {
                state.clear_file();
            }
            Vec::new()
        }
        Msg::RedactClicked => {
            // One job in flight at a time; submission without a selection is
            // rejected as a no-op.
            if !matches!(state.phase(), Phase::Idle) {
                return (state, Vec::new());
            }
            let Some(file) = state.selected_file().cloned() else {
                return (state, Vec::new());
            };
            let job_id = state.begin_job();
            vec![Effect::StartRedaction { job_id, file }]
        }
        Msg::JobProgress { job_id, stage } => {
            state.apply_progress(job_id, stage);
            Vec::new()
        }
        Msg::JobSucceeded { job_id, handle } => {
            if state.complete_job(job_id, handle) {
                Vec::new()
            } else {
                // The handle was already minted for a job nobody is waiting
                // on; revoke it right away so it cannot accumulate.
                vec![Effect::ReleaseDownload { handle }]
            }
        }
        Msg::JobFailed { job_id, message } => {
            state.fail_job(job_id, message);
            Vec::new()
        }
        Msg::ResetClicked => match state.reset() {
            Some(handle) => vec![Effect::ReleaseDownload { handle }],
            None => Vec::new(),
        },
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
