//! Axum route handlers for the Reports API.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::document::{ReportDocument, ReportMeta, Tariff};
use crate::errors::AppError;
use crate::state::AppState;

const STORAGE_KEY_HEADER: HeaderName = HeaderName::from_static("x-storage-key");
const RENDER_PATH_HEADER: HeaderName = HeaderName::from_static("x-render-path");
const PAGE_COUNT_HEADER: HeaderName = HeaderName::from_static("x-page-count");

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub raw_text: String,
    /// Tariff code (`T0`..`T3`). Unknown codes render with the safe theme.
    #[serde(default)]
    pub tariff: Option<String>,
    #[serde(default)]
    pub meta: ReportMeta,
    /// Persist the PDF and return its key in `x-storage-key`.
    #[serde(default)]
    pub store: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub raw_text: String,
    #[serde(default)]
    pub tariff: Option<String>,
    #[serde(default)]
    pub meta: ReportMeta,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document: ReportDocument,
}

fn parse_tariff(code: Option<&str>) -> Option<Tariff> {
    code.and_then(Tariff::parse)
}

fn validate_text(raw_text: &str) -> Result<(), AppError> {
    if raw_text.trim().is_empty() {
        return Err(AppError::Validation("raw_text cannot be empty".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/reports/render
///
/// Renders raw report text to a themed PDF. Always answers with a PDF for
/// non-empty text: structural failures degrade to the plain layout.
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Response, AppError> {
    validate_text(&request.raw_text)?;

    let tariff = parse_tariff(request.tariff.as_deref());
    let mut meta = request.meta;
    if request.store && meta.id.is_none() {
        meta.id = Some(Uuid::new_v4().to_string());
    }

    let service = Arc::clone(&state.service);
    let render_meta = meta.clone();
    let raw_text = request.raw_text;
    let rendered = tokio::task::spawn_blocking(move || {
        service.generate_pdf(&raw_text, tariff, &render_meta, None)
    })
    .await
    .map_err(|e| anyhow::anyhow!("render task failed: {e}"))?;

    let storage_key = match (request.store, meta.id.as_deref()) {
        (true, Some(id)) => state.service.store_pdf(id, &rendered.bytes).await,
        _ => None,
    };

    let filename = state.service.pdf_filename(
        &meta,
        tariff,
        request.username.as_deref(),
        request.user_id,
    );
    info!(
        report_id = meta.id.as_deref().unwrap_or(""),
        pages = rendered.page_count,
        legacy = rendered.used_legacy_path,
        stored = storage_key.is_some(),
        "report_rendered"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(
        RENDER_PATH_HEADER,
        HeaderValue::from_static(if rendered.used_legacy_path {
            "legacy"
        } else {
            "structured"
        }),
    );
    headers.insert(PAGE_COUNT_HEADER, HeaderValue::from(rendered.page_count));
    if let Some(key) = storage_key {
        if let Ok(value) = HeaderValue::from_str(&key) {
            headers.insert(STORAGE_KEY_HEADER, value);
        }
    }

    Ok((StatusCode::OK, headers, Bytes::from(rendered.bytes)).into_response())
}

/// POST /api/v1/reports/document
///
/// Returns the structured document the renderer would lay out, without
/// rendering it.
pub async fn handle_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    validate_text(&request.raw_text)?;
    let tariff = parse_tariff(request.tariff.as_deref());
    let service = Arc::clone(&state.service);
    let document = tokio::task::spawn_blocking(move || {
        service
            .renderer()
            .builder()
            .build(&request.raw_text, tariff, &request.meta)
    })
    .await
    .map_err(|e| anyhow::anyhow!("document task failed: {e}"))?
    .ok_or_else(|| AppError::Validation("raw_text produced no document".to_string()))?;

    Ok(Json(DocumentResponse { document }))
}

/// GET /api/v1/reports/pdf/*key
pub async fn handle_get_pdf(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.service.fetch_pdf(&key).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        Bytes::from(bytes),
    )
        .into_response())
}

/// DELETE /api/v1/reports/pdf/*key
pub async fn handle_delete_pdf(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.delete_pdf(&key).await?;
    info!(storage_key = %key, "pdf_deleted");
    Ok(StatusCode::NO_CONTENT)
}
