//! HTTP form UI for the submission controller.
//!
//! `GET /` renders the form, `POST /submit` runs one submission from a
//! multipart form (`text`, `file`), `GET /status` reports the state as JSON.
//! CORS-permissive so other local pages can drive it.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::warn;

use speakform_core::error::SubmissionError;
use speakform_core::input::{FileRef, SubmissionForm};
use speakform_core::state::{SubmissionState, SubmissionView};

use crate::controller::SubmissionController;
use crate::page;

/// Headroom for multipart framing and the text field on top of the file.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Build the axum router around a shared [`SubmissionController`].
pub fn router(controller: SubmissionController) -> Router {
    let body_limit = usize::try_from(controller.max_file_bytes())
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/status", get(status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(controller)
}

#[derive(serde::Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    state: SubmissionState,
    view: SubmissionView,
}

impl StatusResponse {
    fn new(state: SubmissionState, notification: Option<String>) -> Self {
        let mut view = state.view();
        if let Some(message) = notification {
            view = view.with_notification(message);
        }
        Self { state, view }
    }
}

async fn index(State(controller): State<SubmissionController>) -> Html<String> {
    Html(page::render(&controller.state().view(), ""))
}

async fn status(State(controller): State<SubmissionController>) -> Json<StatusResponse> {
    Json(StatusResponse::new(controller.state(), None))
}

async fn submit(
    State(controller): State<SubmissionController>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let wants_json = wants_json(&headers);

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => {
            warn!("bad form upload: {message}");
            let body = StatusResponse::new(controller.state(), Some(message));
            return respond(StatusCode::BAD_REQUEST, body, "", wants_json);
        }
    };

    // Echoed back into the textarea so a failed submit can be retried.
    let text = form.text.clone();

    // Spawned so a dropped connection cannot leave the state stuck in Loading.
    let task_controller = controller.clone();
    let result = tokio::spawn(async move { task_controller.submit_form(&form).await }).await;

    let (code, notification) = match result {
        Ok(Ok(_)) => (StatusCode::OK, None),
        Ok(Err(e)) => (status_for(&e), Some(e.user_message())),
        Err(e) => {
            warn!("submission task panicked: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    };

    let body = StatusResponse::new(controller.state(), notification);
    respond(code, body, &text, wants_json)
}

async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, String> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("text") => {
                form.text = field.text().await.map_err(|e| e.to_string())?;
            }
            Some("file") => {
                // Browsers send an empty, unnamed part when no file is chosen.
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                if !name.is_empty() {
                    form.file = Some(FileRef::from_bytes(name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn status_for(err: &SubmissionError) -> StatusCode {
    match err {
        SubmissionError::EmptyInput => StatusCode::BAD_REQUEST,
        SubmissionError::FileRead { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        SubmissionError::ServerRejected { .. } | SubmissionError::Transport(_) => {
            StatusCode::BAD_GATEWAY
        }
        SubmissionError::Busy => StatusCode::CONFLICT,
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn respond(code: StatusCode, body: StatusResponse, text: &str, json: bool) -> Response {
    if json {
        (code, Json(body)).into_response()
    } else {
        (code, Html(page::render(&body.view, text))).into_response()
    }
}
