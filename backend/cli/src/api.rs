use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use qlens_answerer::QuestionAnswerer;
use qlens_core::{Answer, Question};
use qlens_media::{validate_upload, UploadRejection, UploadedImage};
use qlens_understanding::{decode_image, extract_question, OcrError, TextRecognizer};

/// Largest accepted request body, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Shared application state for API handlers. Built once at startup.
pub struct AppState {
    pub recognizer: Arc<dyn TextRecognizer>,
    pub answerer: QuestionAnswerer,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/answer-question", post(answer_question))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn(reject_oversized))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct AnswerResponse {
    extracted_question: Question,
    answer: Answer,
}

/// Ways a question request can end without an answer.
#[derive(Debug, Error)]
enum ApiError {
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadRejection),

    #[error("no clear question found in the image")]
    NoQuestion,

    #[error("upload exceeds the request size limit")]
    PayloadTooLarge,

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("multipart stream error: {0}")]
    Multipart(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Multipart(e.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Upload(rejection) => {
                (StatusCode::BAD_REQUEST, json!({ "error": rejection.message() }))
            }
            ApiError::NoQuestion => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "No clear question found in the image",
                    "extracted_text": "",
                }),
            ),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": "File too large" }))
            }
            ApiError::Ocr(_) | ApiError::Multipart(_) | ApiError::Task(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Refuse bodies whose declared length is over the cap before any handler runs.
///
/// Bodies without `Content-Length` are capped by `DefaultBodyLimit` while the
/// multipart stream is read.
async fn reject_oversized(request: Request, next: Next) -> Response {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(len) if len > MAX_UPLOAD_BYTES as u64 => {
            info!(content_length = len, "Request rejected: body too large");
            ApiError::PayloadTooLarge.into_response()
        }
        _ => next.run(request).await,
    }
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "qlens",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /answer-question: OCR the uploaded image and answer the question in it.
async fn answer_question(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("answer_question", %request_id);

    async move {
        match process_question_image(&state, multipart).await {
            Ok(response) => Json(response).into_response(),
            Err(err) => {
                match &err {
                    ApiError::Ocr(_) | ApiError::Multipart(_) | ApiError::Task(_) => {
                        error!(error = %err, "Question image processing failed");
                    }
                    _ => info!(reason = %err, "Request rejected"),
                }
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn process_question_image(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<AnswerResponse, ApiError> {
    // A body that is not multipart carries no file part.
    let multipart = multipart.map_err(|_| UploadRejection::NoFilePart)?;
    let upload = read_image_part(multipart).await?;

    info!(
        filename = %upload.filename,
        mime = upload.mime_type(),
        bytes = upload.bytes.len(),
        "Image received"
    );

    let bytes = upload.bytes;
    let image = tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;

    let extracted = state.recognizer.recognize(image).await?;
    let full_text = extracted.joined();
    info!(fragments = extracted.fragments.len(), chars = full_text.len(), "Text extracted");

    let question = extract_question(&full_text).ok_or(ApiError::NoQuestion)?;

    let answer = match state.answerer.answer(&question).await {
        Ok(answer) => answer,
        Err(e) => QuestionAnswerer::fallback_answer(&e),
    };

    Ok(AnswerResponse {
        extracted_question: question,
        answer,
    })
}

/// Read the whole form, keep the first `image` file part, then validate its
/// filename.
///
/// Parts without a filename are form fields, not files, and are skipped.
/// Every part is drained so an oversized form is refused as a whole.
async fn read_image_part(mut multipart: Multipart) -> Result<UploadedImage, ApiError> {
    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        let filename = (field.name() == Some(IMAGE_FIELD))
            .then(|| field.file_name().map(str::to_owned))
            .flatten();
        let bytes = field.bytes().await?;
        if image.is_none() {
            if let Some(filename) = filename {
                image = Some(UploadedImage::new(filename, bytes));
            }
        }
    }

    let image = image.ok_or(UploadRejection::NoFilePart)?;
    validate_upload(Some(image.filename.as_str()))?;
    Ok(image)
}
