use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use vapers_accounting::Month;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/months", get(list_months))
        .route("/report", get(monthly_report))
        .route("/savings", get(savings))
}

pub async fn list_entries(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.finance.entries() {
        Ok(items) => {
            let items = items.iter().map(dto::finance_entry_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateFinanceEntryRequest>,
) -> axum::response::Response {
    let cmd = match body.into_command(Utc::now()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.finance.record(cmd) {
        Ok(entry) => {
            (StatusCode::CREATED, Json(dto::finance_entry_to_json(&entry))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_months(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.finance.months() {
        Ok(items) => {
            let items = items.iter().map(Month::to_string).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Report for `?month=YYYY-MM`; defaults to the newest month with entries
/// (or the current month when the ledger is empty).
pub async fn monthly_report(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ReportQuery>,
) -> axum::response::Response {
    let month = match query.month.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(raw) => match raw.parse::<Month>() {
            Ok(m) => m,
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => match services.finance.months() {
            Ok(months) => months.first().copied().unwrap_or_else(|| Month::of(Utc::now())),
            Err(e) => return errors::domain_error_to_response(e),
        },
    };

    let revenue = match services.inventory.sales_revenue() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.finance.report(month, Some(revenue)) {
        Ok(report) => (StatusCode::OK, Json(dto::report_to_json(&report))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn savings(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.finance.savings() {
        Ok(balance) => (StatusCode::OK, Json(dto::savings_to_json(&balance))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
