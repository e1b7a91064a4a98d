use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use futures::future::join_all;
use tracing::info;

use crate::{
    error::ReportCardError,
    extractors::ValidatedJson,
    models::report_card::{
        BatchDocument, BatchFailure, BatchRenderRequest, BatchRenderResponse,
        RenderReportCardRequest,
    },
    services::{
        report_card::{RenderedReportCard, ReportCardJob},
        AppState,
    },
};

pub const PAGE_COUNT_HEADER: &str = "x-page-count";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<ReportCardError> for ApiError {
    fn from(err: ReportCardError) -> Self {
        if err.is_input_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        let json_response = serde_json::json!({
            "message": message,
            "status": status.as_u16()
        });
        (status, Json(json_response)).into_response()
    }
}

/// POST /api/v1/report-cards - one report card as a PDF download
pub async fn render_report_card(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RenderReportCardRequest>,
) -> Result<Response, ApiError> {
    let job = ReportCardJob::from(request);
    let rendered = generate_blocking(&state, job).await??;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", rendered.filename),
        )
        .header(PAGE_COUNT_HEADER, rendered.page_count)
        .body(Body::from(rendered.bytes))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// POST /api/v1/report-cards/batch - one document per student, rendered in
/// parallel; a failing student does not fail the others
pub async fn render_batch(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<BatchRenderRequest>,
) -> Result<Json<BatchRenderResponse>, ApiError> {
    let max_batch_size = state.config.report.max_batch_size;
    if request.students.len() > max_batch_size {
        return Err(ApiError::BadRequest(format!(
            "Batch of {} students exceeds the limit of {}",
            request.students.len(),
            max_batch_size
        )));
    }

    let tasks = ReportCardJob::from_batch(request).into_iter().map(|job| {
        let state = state.clone();
        async move {
            let student = job.student.full_name.clone();
            (student, generate_blocking(&state, job).await)
        }
    });

    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for (student, outcome) in join_all(tasks).await {
        match outcome {
            Ok(Ok(rendered)) => documents.push(BatchDocument {
                student,
                filename: rendered.filename,
                page_count: rendered.page_count,
                content_base64: general_purpose::STANDARD.encode(&rendered.bytes),
            }),
            Ok(Err(err)) => failures.push(BatchFailure {
                student,
                error: err.to_string(),
            }),
            Err(ApiError::BadRequest(error) | ApiError::Internal(error)) => {
                failures.push(BatchFailure { student, error })
            }
        }
    }

    info!(
        documents = documents.len(),
        failures = failures.len(),
        "Batch of report cards rendered"
    );

    Ok(Json(BatchRenderResponse {
        documents,
        failures,
    }))
}

/// Layout and PDF serialisation are CPU-bound, so they run off the async
/// workers.
async fn generate_blocking(
    state: &AppState,
    job: ReportCardJob,
) -> Result<Result<RenderedReportCard, ReportCardError>, ApiError> {
    let service = state.report_cards.clone();
    tokio::task::spawn_blocking(move || service.generate(&job))
        .await
        .map_err(|e| ApiError::Internal(format!("Render task failed: {}", e)))
}
