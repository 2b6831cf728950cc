// src/dos_handlers.rs
use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;
use crate::dos::{compute_dos, filter_by_status, summarize};
use crate::error::ApiResult;
use crate::export::{dos_export_filename, dos_to_csv};
use crate::filters::{parse_statuses, DashboardQuery};
use crate::handlers::{current_dataset, ApiResponse};
use crate::models::{DosSummary, ProductDosEntry};

#[derive(Debug, Serialize)]
pub struct DosReport {
    pub window_days: u32,
    pub total_products: usize,
    /// Anchor of the trailing window
    pub latest_sales_date: Option<NaiveDate>,
    /// Counts over all products, before the status filter
    pub summary: DosSummary,
    pub entries: Vec<ProductDosEntry>,
}

/// Classified, status-filtered DOS table and the unfiltered summary.
///
/// The table covers all warehouses and the trailing window, so only
/// `statuses` is read from the query.
fn build_report(app_state: &AppState, query: &DashboardQuery) -> ApiResult<DosReport> {
    let dataset = current_dataset(app_state)?;
    let statuses = match &query.statuses {
        Some(raw) => parse_statuses(raw)?,
        None => Vec::new(),
    };
    let window_days = app_state.config.dos.window_days;

    let entries = compute_dos(&dataset.stock, &dataset.sales, window_days);
    let summary = summarize(&entries);

    Ok(DosReport {
        window_days,
        total_products: summary.total(),
        latest_sales_date: dataset.latest_sales_date(),
        summary,
        entries: filter_by_status(entries, &statuses),
    })
}

pub async fn get_dos(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let report = build_report(&app_state, &query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

pub async fn get_dos_summary(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let report = build_report(&app_state, &query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(report.summary)))
}

pub async fn export_dos(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let report = build_report(&app_state, &query)?;
    let csv_data = dos_to_csv(&report.entries)?;
    let filename = dos_export_filename(Utc::now().date_naive());

    log::info!("Exported DOS report with {} rows", report.entries.len());

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", filename)))
        .body(csv_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::app_state;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_dos_table_and_summary() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .route("/dos", web::get().to(get_dos)),
        )
        .await;

        let req = test::TestRequest::get().uri("/dos").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let data = &body["data"];

        assert_eq!(data["window_days"], 21);
        assert_eq!(data["total_products"], 3);
        assert_eq!(data["latest_sales_date"], "2024-03-21");

        // Widget: 100 шт., 10 в день -> 10 дней
        let entries = data["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["stock_name"], "Widget");
        assert_eq!(entries[0]["dos_days"], 10.0);
        assert_eq!(entries[0]["status"], "Low Stock (<14 Days)");
        // При равном DOS и нулевом ADS сохраняется порядок остатков
        assert_eq!(entries[1]["stock_code"], "B");
        assert_eq!(entries[1]["dos_days"], 9999.0);
        assert_eq!(entries[1]["status"], "Dead Stock (No Sales)");
        assert_eq!(entries[2]["stock_code"], "C");
        assert_eq!(entries[2]["status"], "Out of Stock");

        assert_eq!(data["summary"]["low_stock"], 1);
        assert_eq!(data["summary"]["dead_stock"], 1);
        assert_eq!(data["summary"]["out_of_stock"], 1);
        assert_eq!(data["summary"]["healthy"], 0);
    }

    #[actix_web::test]
    async fn test_status_filter_keeps_summary() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .route("/dos", web::get().to(get_dos)),
        )
        .await;

        let req = test::TestRequest::get().uri("/dos?statuses=dead_stock").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["summary"]["low_stock"], 1);
    }

    #[actix_web::test]
    async fn test_unknown_status_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .route("/dos/summary", web::get().to(get_dos_summary)),
        )
        .await;

        let req = test::TestRequest::get().uri("/dos/summary?statuses=restock").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_dashboard_params_do_not_affect_dos() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .route("/dos", web::get().to(get_dos)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/dos?warehouse_types=Nowhere&start=2024-03-10&end=2024-03-01&statuses=low_stock")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["entries"][0]["stock_name"], "Widget");
    }

    #[actix_web::test]
    async fn test_csv_export() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .route("/dos/export", web::get().to(export_dos)),
        )
        .await;

        let req = test::TestRequest::get().uri("/dos/export?statuses=low_stock").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("text/csv; charset=utf-8")
        );

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "Low Stock (<14 Days),A,Widget,100,10.00,10.0");
    }
}
