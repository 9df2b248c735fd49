use askama::Template;
use redactor_core::{AppViewModel, FileCardView, PhaseView};

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate {
    fragment: String,
}

#[derive(Template)]
#[template(path = "idle.html")]
struct IdleTemplate {
    selected: Option<FileCardView>,
    notice: Option<String>,
    can_submit: bool,
}

#[derive(Template)]
#[template(path = "processing.html")]
struct ProcessingTemplate {
    stage_label: &'static str,
}

#[derive(Template)]
#[template(path = "complete.html")]
struct CompleteTemplate {
    download_url: String,
    download_name: &'static str,
}

/// Render the swap fragment for the current state.
pub fn render_fragment(view: &AppViewModel) -> Result<String, askama::Error> {
    match &view.phase {
        PhaseView::Idle {
            selected,
            notice,
            can_submit,
        } => IdleTemplate {
            selected: selected.clone(),
            notice: notice.clone(),
            can_submit: *can_submit,
        }
        .render(),
        PhaseView::Processing { stage_label } => ProcessingTemplate { stage_label }.render(),
        PhaseView::Complete {
            handle,
            download_name,
        } => CompleteTemplate {
            download_url: format!("/download/{}", handle.0),
            download_name,
        }
        .render(),
    }
}

/// Render the full page shell around the current state's fragment.
pub fn render_page(view: &AppViewModel) -> Result<String, askama::Error> {
    let fragment = render_fragment(view)?;
    PageTemplate { fragment }.render()
}
