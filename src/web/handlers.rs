use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde_json::Value;

use super::{ApiResponse, AppState, UploadSummary};
use crate::request::UploadRequest;
use crate::utils::error::AppError;

/// Price a batch of products and push the results to the webhook.
pub async fn upload_products(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UploadSummary>>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let batch = request.into_batch()?;

    tracing::info!(
        products = batch.products.len(),
        strategy = %batch.strategy,
        "Accepted price batch"
    );

    let report = state.service.process(&batch).await?;
    Ok(Json(ApiResponse::success(UploadSummary::new(
        batch.products.len(),
        report.results.len(),
    ))))
}

pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "torob-pricer"
    }))
}

pub async fn system_info(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let config = &state.config;
    Json(ApiResponse::success(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "site": config.site.base_url,
        "max_concurrent_jobs": config.scraper.max_concurrent_jobs,
        "wait_timeout_secs": config.scraper.wait_timeout,
        "strategies": ["cheapest", "average-rounded-up"],
    })))
}
