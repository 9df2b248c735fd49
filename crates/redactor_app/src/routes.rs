use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_htmx::HxRequest;
use redactor_core::{DownloadHandle, Msg, SelectedFile, DOWNLOAD_FILE_NAME};

use crate::app::App;
use crate::views;

/// Inputs are small text files; anything bigger than this is rejected.
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn router(app: App) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/view", get(view_fragment))
        .route("/files", post(select_file))
        .route("/files/clear", post(clear_file))
        .route("/redact", post(redact))
        .route("/reset", post(reset))
        .route("/download/{id}", get(download))
        .route("/static/app.css", get(app_css))
        .route("/static/app.js", get(app_js))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(app)
}

enum AppError {
    Render(askama::Error),
    BadRequest(String),
    Gone,
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Render(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Render(err) => {
                redactor_logging::redact_error!("template rendering failed: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            AppError::Gone => {
                (StatusCode::GONE, "this download is no longer available").into_response()
            }
        }
    }
}

async fn index(State(app): State<App>) -> Result<Html<String>, AppError> {
    Ok(Html(views::render_page(&app.view())?))
}

/// Current state as a fragment for htmx swaps, or as a full page for a plain
/// browser request (e.g. a reload while processing).
async fn view_fragment(
    State(app): State<App>,
    HxRequest(is_htmx): HxRequest,
) -> Result<Html<String>, AppError> {
    let view = app.view();
    if is_htmx {
        Ok(Html(views::render_fragment(&view)?))
    } else {
        Ok(Html(views::render_page(&view)?))
    }
}

async fn select_file(
    State(app): State<App>,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let Some(file) = read_file_field(&mut multipart).await? else {
        return Err(AppError::BadRequest("no file in upload".to_string()));
    };
    Ok(Html(views::render_fragment(
        &app.dispatch(Msg::FileSelected(file)),
    )?))
}

async fn clear_file(State(app): State<App>) -> Result<Html<String>, AppError> {
    Ok(Html(views::render_fragment(&app.dispatch(Msg::FileCleared))?))
}

async fn redact(State(app): State<App>) -> Result<Html<String>, AppError> {
    Ok(Html(views::render_fragment(
        &app.dispatch(Msg::RedactClicked),
    )?))
}

async fn reset(State(app): State<App>) -> Result<Html<String>, AppError> {
    Ok(Html(views::render_fragment(&app.dispatch(Msg::ResetClicked))?))
}

async fn download(
    State(app): State<App>,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let Some(text) = app.download_text(DownloadHandle(id)) else {
        return Err(AppError::Gone);
    };
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/plain; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        text,
    )
        .into_response())
}

async fn app_css() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_str!("../static/app.css"),
    )
}

async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        include_str!("../static/app.js"),
    )
}

/// Pull the single `file` field out of the multipart form. The whole file is
/// buffered into memory up front; inputs are small text files by contract.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<SelectedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.txt").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(err.to_string()))?;
        return Ok(Some(SelectedFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}
