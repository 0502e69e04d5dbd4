use axum::extract::{FromRequest, Multipart, Request, State};
use axum::extract::multipart::MultipartRejection;
use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::state::AppState;
use crate::mail::{self, MessageFormat, ParsedMessage, RawMessage};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/parse", post(parse_upload))
        .route("/summarise", post(summarise))
        .route("/livez", get(|| async { "OK" }))
        .route("/readyz", get(|| async { "OK" }))
}

async fn parse_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParsedMessage>, ApiError> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let format = MessageFormat::from_filename(filename.as_deref());
    tracing::info!(
        filename = filename.as_deref().unwrap_or(""),
        size = bytes.len(),
        ?format,
        "Parsing upload"
    );

    let raw = RawMessage::new(bytes.to_vec(), format);
    let scrubber = state.scrubber.clone();
    let parsed = tokio::task::spawn_blocking(move || mail::extract(&raw, &scrubber))
        .await
        .map_err(|e| ApiError::Internal(format!("Extraction task failed: {e}")))??;

    Ok(Json(parsed))
}

#[derive(Debug, Deserialize)]
struct SummariseForm {
    text: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    summary: String,
}

async fn summarise(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<SummaryResponse>, ApiError> {
    let form = read_summarise_form(request).await?;

    let summary = state.gateway.summarize(&form.text, &form.prompt).await?;
    tracing::info!(summary_len = summary.len(), "Summary generated");

    Ok(Json(SummaryResponse { summary }))
}

/// Accept the two fields either url-encoded or as multipart form data.
async fn read_summarise_form(request: Request) -> Result<SummariseForm, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Form(form) = Form::<SummariseForm>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        return Ok(form);
    }

    let mut multipart = Multipart::from_request(request, &()).await?;
    let mut text = None;
    let mut prompt = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => text = Some(field.text().await?),
            Some("prompt") => prompt = Some(field.text().await?),
            _ => {}
        }
    }

    match (text, prompt) {
        (Some(text), Some(prompt)) => Ok(SummariseForm { text, prompt }),
        (None, _) => Err(ApiError::BadRequest("Missing field `text`".to_string())),
        (_, None) => Err(ApiError::BadRequest("Missing field `prompt`".to_string())),
    }
}
