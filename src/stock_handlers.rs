// src/stock_handlers.rs
use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiResult;
use crate::filters::DashboardQuery;
use crate::handlers::{dataset_and_filter, ApiResponse};
use crate::stock_analytics::{build_overview, DEFAULT_TOP_SKUS};

pub async fn get_stock_overview(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let (dataset, filter) = dataset_and_filter(&app_state, &query)?;
    let rows = filter.stock_rows(&dataset);
    let overview = build_overview(&rows, filter.limit_or(DEFAULT_TOP_SKUS));

    Ok(HttpResponse::Ok().json(ApiResponse::success(overview)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::app_state;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_overview_for_selected_type() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .route("/stock/overview", web::get().to(get_stock_overview)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/stock/overview?warehouse_types=Main")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let data = &body["data"];

        assert_eq!(data["total_quantity"], 110);
        assert_eq!(data["distribution"][0]["share_label"], "100.0%");
        assert_eq!(data["top_skus"][0]["stock_name"], "Widget");
        assert_eq!(data["breakdowns"][0]["locations"][0]["warehouse_name"], "KL");
    }

    #[actix_web::test]
    async fn test_no_valid_warehouse_type() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .route("/stock/overview", web::get().to(get_stock_overview)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/stock/overview?warehouse_types=Nowhere")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
