// src/sales_handlers.rs
use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiResult;
use crate::filters::DashboardQuery;
use crate::handlers::{dataset_and_filter, ApiResponse};
use crate::sales_analytics::{
    channel_breakdown, product_performance, sales_trend, summary, DEFAULT_TOP_CUSTOMERS, DEFAULT_TOP_MODELS,
};

pub async fn get_sales_summary(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let (dataset, filter) = dataset_and_filter(&app_state, &query)?;
    let rows = filter.sales_rows(&dataset);
    let result = summary(&rows, filter.primary, filter.comparison);

    if result.current.is_none() {
        return Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            result,
            "No sales data found for the primary selected range".to_string(),
        )));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

pub async fn get_sales_trend(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let (dataset, filter) = dataset_and_filter(&app_state, &query)?;
    let rows = filter.sales_rows(&dataset);
    let trend = sales_trend(&rows, filter.primary, filter.granularity);

    Ok(HttpResponse::Ok().json(ApiResponse::success(trend)))
}

pub async fn get_sales_channels(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let (dataset, filter) = dataset_and_filter(&app_state, &query)?;
    let rows = filter.sales_rows(&dataset);
    let breakdown = channel_breakdown(
        &rows,
        filter.primary,
        filter.comparison,
        filter.limit_or(DEFAULT_TOP_CUSTOMERS),
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(breakdown)))
}

pub async fn get_sales_products(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let (dataset, filter) = dataset_and_filter(&app_state, &query)?;
    let rows = filter.sales_rows(&dataset);
    let performance = product_performance(&rows, filter.primary, filter.limit_or(DEFAULT_TOP_MODELS));

    Ok(HttpResponse::Ok().json(ApiResponse::success(performance)))
}
