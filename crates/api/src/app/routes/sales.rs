use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sales))
        .route("/stats", get(sales_stats))
}

pub async fn record_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordSaleRequest>,
) -> axum::response::Response {
    let product_id = match body.product_id() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product = match services.inventory.product(&product_id) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let cmd = match body.into_command(product.unit_price(), Utc::now()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.inventory.record_sale(cmd) {
        Ok(sale) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "mensaje": "Venta registrada",
                "data": dto::sale_to_json(&sale),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory.sales() {
        Ok(items) => {
            let items = items.iter().map(dto::sale_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn sales_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StatsQuery>,
) -> axum::response::Response {
    let view = match query.into_view() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory.sales_statistics(&view) {
        Ok(result) => {
            tracing::debug!(
                rows = result.filtered_sorted_rows.len(),
                sort = view.sort_key.as_str(),
                "sales statistics computed"
            );
            (StatusCode::OK, Json(dto::stats_to_json(&result))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
