// src/handlers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;
use crate::dataset::{Dataset, DatasetInfo};
use crate::error::{ApiError, ApiResult};
use crate::filters::{DashboardFilter, DashboardQuery, FilterOptions};

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// Current snapshot; 503 while nothing is loaded.
pub fn current_dataset(app_state: &AppState) -> ApiResult<Arc<Dataset>> {
    let dataset = app_state.store.snapshot();
    if dataset.stock.is_empty() && dataset.sales.is_empty() {
        return Err(ApiError::DataUnavailable("No stock or sales data loaded".to_string()));
    }
    Ok(dataset)
}

/// Snapshot plus the filter built from the request query.
pub fn dataset_and_filter(
    app_state: &AppState,
    query: &DashboardQuery,
) -> ApiResult<(Arc<Dataset>, DashboardFilter)> {
    let dataset = current_dataset(app_state)?;
    let filter = DashboardFilter::from_query(query, &dataset)?;
    Ok((dataset, filter))
}

pub async fn not_found(req: HttpRequest) -> ApiResult<HttpResponse> {
    Err(ApiError::NotFound(format!("No route for {} {}", req.method(), req.path())))
}

// ==================== FILTERS ====================

pub async fn get_filter_options(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let dataset = current_dataset(&app_state)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(FilterOptions::for_dataset(&dataset))))
}

// ==================== ADMIN ====================

pub async fn reload_data(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let store = app_state.store.clone();
    let result = web::block(move || store.reload())
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Reload task failed: {}", e)))?;

    app_state.metrics.record_reload(result.is_ok());

    let dataset = result.map_err(|e| {
        log::error!("Manual data reload failed: {}", e);
        ApiError::from(e)
    })?;

    let info: DatasetInfo = dataset.info();
    log::info!(
        "Manual data reload: {} stock rows, {} sales rows",
        info.stock_rows,
        info.sales_rows
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        info,
        "Data reloaded".to_string(),
    )))
}

// ==================== TEST SUPPORT ====================
