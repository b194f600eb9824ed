use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn record_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordPurchaseRequest>,
) -> axum::response::Response {
    let cmd = match body.into_command(Utc::now()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.inventory.record_purchase(cmd) {
        Ok(purchase) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "mensaje": "Compra registrada",
                "data": dto::purchase_to_json(&purchase),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_purchases(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory.purchases() {
        Ok(items) => {
            let items = items.iter().map(dto::purchase_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
