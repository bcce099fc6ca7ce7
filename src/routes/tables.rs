use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    services::{
        cleaning::{CleaningReport, RemovedRowsResult},
        csv::types::AnalysisResult,
    },
    AppState,
};

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "text/plain",
    "application/vnd.ms-excel",
    "application/octet-stream",
];

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/api/v1/csv/analyse-csv", post(analyze_csv))
        .route("/api/v1/csv/clean/remove-nulls", post(clean_csv))
        .route("/api/v1/csv/clean/remove-nulls/download", post(download_cleaned_csv))
        .route("/api/v1/csv/removed-rows", post(get_removed_rows))
        // Legacy path
        .route("/analyse-csv", post(analyze_csv))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
struct CleanParams {
    #[serde(default = "default_remove_duplicates")]
    remove_duplicates: bool,
}

fn default_remove_duplicates() -> bool {
    true
}

/// A single uploaded file, held only for the lifetime of the request.
#[derive(Debug)]
struct Upload {
    filename: Option<String>,
    data: Bytes,
}

#[axum::debug_handler]
async fn analyze_csv(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let upload = read_upload(multipart).await?;
    tracing::info!("Analyzing file: {:?}", upload.filename);

    let mut analysis = state.processor.analyze_csv(&upload.data)?;
    analysis.filename = upload.filename;
    Ok(Json(analysis))
}

#[axum::debug_handler]
async fn clean_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CleanParams>,
    multipart: Multipart,
) -> Result<Json<CleaningReport>, AppError> {
    let upload = read_upload(multipart).await?;
    tracing::info!(
        "Cleaning file: {:?}, remove_duplicates: {}",
        upload.filename,
        params.remove_duplicates
    );

    let mut report = state
        .processor
        .clean_csv(&upload.data, params.remove_duplicates)?;
    report.filename = upload.filename;
    Ok(Json(report))
}

#[axum::debug_handler]
async fn download_cleaned_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CleanParams>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(multipart).await?;
    let cleaned = state
        .processor
        .clean_and_download(&upload.data, params.remove_duplicates)?;

    let filename = format!(
        "cleaned_{}",
        sanitize_filename(upload.filename.as_deref().unwrap_or("data.csv"))
    );
    tracing::info!("Returning cleaned file: {}", filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        cleaned,
    )
        .into_response())
}

#[axum::debug_handler]
async fn get_removed_rows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CleanParams>,
    multipart: Multipart,
) -> Result<Json<RemovedRowsResult>, AppError> {
    let upload = read_upload(multipart).await?;
    let mut result = state
        .processor
        .get_removed_rows(&upload.data, params.remove_duplicates)?;
    result.filename = upload.filename;
    Ok(Json(result))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        validate_upload(filename.as_deref(), content_type.as_deref())?;

        let data = field.bytes().await?;
        tracing::info!(
            "Received upload {:?}, size: {}KB",
            filename,
            data.len() / 1024
        );
        return Ok(Upload { filename, data });
    }

    Err(AppError::InvalidInput("No file provided".to_string()))
}

fn validate_upload(filename: Option<&str>, content_type: Option<&str>) -> Result<(), AppError> {
    if let Some(name) = filename {
        if !name.to_lowercase().ends_with(".csv") {
            return Err(AppError::UnsupportedInput(format!(
                "Only CSV files are supported, got {}",
                name
            )));
        }
    }

    if let Some(content_type) = content_type {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
            return Err(AppError::UnsupportedInput(format!(
                "Unsupported content type: {}",
                content_type
            )));
        }
    }

    Ok(())
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if "<>:\"/\\|?*".contains(c) || c.is_control() { '_' } else { c })
        .collect::<String>()
        .trim_matches(|c| c == ' ' || c == '.')
        .to_string()
}
