use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use vapers_accounting::{
    FinanceEntry, FinanceTag, MonthlyReport, RecordFinanceEntry, ReportLine, SavingsBalance,
};
use vapers_core::{FinanceEntryId, Money, ProductId, PurchaseId, SaleId};
use vapers_products::{CreateProduct, Product};
use vapers_purchasing::{Purchase, RecordPurchase};
use vapers_sales::{
    AggregationResult, RecordSale, SaleRecord, SaleRow, SalesView, SortDirection, SortKey,
};

use crate::app::errors;

/// Largest euro amount accepted on the wire.
const MAX_EUROS: f64 = 1e13;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(rename = "nombre", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "imagen", alias = "image")]
    pub image: Option<String>,
    pub stock: Option<i64>,
    #[serde(rename = "precio_unitario", alias = "unit_price")]
    pub unit_price: Option<f64>,
}

impl CreateProductRequest {
    pub fn into_command(
        self,
        now: DateTime<Utc>,
    ) -> Result<CreateProduct, axum::response::Response> {
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(errors::bad_request("El nombre es obligatorio"));
        }

        let stock = self
            .stock
            .and_then(|s| u32::try_from(s).ok())
            .ok_or_else(|| errors::bad_request("Stock debe ser un número positivo"))?;

        let unit_price = match self.unit_price {
            Some(p) if p > 0.0 => euros_to_money("precio_unitario", p)?,
            _ => return Err(errors::bad_request("Precio debe ser mayor a 0")),
        };

        Ok(CreateProduct {
            product_id: ProductId::new(),
            name,
            image: self.image,
            stock,
            unit_price,
            occurred_at: now,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub stock: i64,
}

impl UpdateStockRequest {
    pub fn stock(&self) -> Result<u32, axum::response::Response> {
        u32::try_from(self.stock)
            .map_err(|_| errors::bad_request("Stock debe ser un número positivo"))
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordPurchaseRequest {
    #[serde(rename = "idVaper", alias = "id_vaper")]
    pub product_id: String,
    #[serde(rename = "cantidad", alias = "quantity")]
    pub quantity: i64,
    #[serde(rename = "precioUnitario", alias = "precio_unitario")]
    pub unit_price: f64,
}

impl RecordPurchaseRequest {
    pub fn into_command(
        self,
        now: DateTime<Utc>,
    ) -> Result<RecordPurchase, axum::response::Response> {
        Ok(RecordPurchase {
            purchase_id: PurchaseId::new(),
            product_id: parse_product_id(&self.product_id)?,
            quantity: positive_quantity(self.quantity)?,
            unit_price: euros_to_money("precioUnitario", self.unit_price)?,
            occurred_at: now,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    #[serde(rename = "idVaper", alias = "id_vaper")]
    pub product_id: String,
    #[serde(rename = "cantidad", alias = "quantity")]
    pub quantity: i64,
    /// Defaults to the product's list price when omitted.
    #[serde(rename = "precioUnitario", alias = "precio_unitario")]
    pub unit_price: Option<f64>,
    #[serde(rename = "cliente", alias = "customer")]
    pub customer: Option<String>,
}

impl RecordSaleRequest {
    pub fn product_id(&self) -> Result<ProductId, axum::response::Response> {
        parse_product_id(&self.product_id)
    }

    pub fn into_command(
        self,
        list_price: Money,
        now: DateTime<Utc>,
    ) -> Result<RecordSale, axum::response::Response> {
        let unit_price = match self.unit_price {
            Some(p) => euros_to_money("precioUnitario", p)?,
            None => list_price,
        };

        Ok(RecordSale {
            sale_id: SaleId::new(),
            product_id: parse_product_id(&self.product_id)?,
            quantity: positive_quantity(self.quantity)?,
            unit_price,
            customer: self.customer,
            occurred_at: now,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFinanceEntryRequest {
    #[serde(rename = "titulo", alias = "title")]
    pub title: Option<String>,
    #[serde(rename = "precio", alias = "amount")]
    pub amount: Option<f64>,
    #[serde(rename = "descripcion", alias = "description")]
    pub description: Option<String>,
    pub tag: Option<String>,
}

impl CreateFinanceEntryRequest {
    pub fn into_command(
        self,
        now: DateTime<Utc>,
    ) -> Result<RecordFinanceEntry, axum::response::Response> {
        let tag = self
            .tag
            .as_deref()
            .unwrap_or_default()
            .parse::<FinanceTag>()
            .map_err(errors::domain_error_to_response)?;
        let amount = match self.amount {
            Some(a) => euros_to_money("precio", a)?,
            None => return Err(errors::bad_request("precio is required")),
        };

        Ok(RecordFinanceEntry {
            entry_id: FinanceEntryId::new(),
            title: self.title.unwrap_or_default(),
            amount,
            description: self.description,
            tag,
            occurred_at: now,
        })
    }
}

/// Query string of `GET /api/ventas/stats`.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    /// RFC 3339 instant or `YYYY-MM-DD` (start of that day).
    pub from: Option<String>,
    /// RFC 3339 instant or `YYYY-MM-DD` (end of that day).
    pub to: Option<String>,
}

impl StatsQuery {
    pub fn into_view(self) -> Result<SalesView, axum::response::Response> {
        let mut view = SalesView {
            filter_text: self.q.unwrap_or_default(),
            ..SalesView::default()
        };
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            view.sort_key = sort.parse::<SortKey>().map_err(errors::domain_error_to_response)?;
        }
        if let Some(dir) = self.dir.as_deref().filter(|s| !s.trim().is_empty()) {
            view.direction = dir
                .parse::<SortDirection>()
                .map_err(errors::domain_error_to_response)?;
        }
        view.from = self.from.as_deref().map(|s| parse_bound("from", s, false)).transpose()?;
        view.to = self.to.as_deref().map(|s| parse_bound("to", s, true)).transpose()?;
        Ok(view)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub month: Option<String>,
}

// -------------------------
// Wire helpers
// -------------------------

/// Convert a decimal euro amount into cents, rounding to the nearest cent.
pub fn euros_to_money(field: &str, euros: f64) -> Result<Money, axum::response::Response> {
    if !euros.is_finite() || euros < 0.0 || euros > MAX_EUROS {
        return Err(errors::bad_request(format!(
            "{field} must be a non-negative amount"
        )));
    }
    Ok(Money::from_cents((euros * 100.0).round() as u64))
}

pub fn money_to_euros(amount: Money) -> f64 {
    amount.cents() as f64 / 100.0
}

fn cents_to_euros(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn positive_quantity(quantity: i64) -> Result<u32, axum::response::Response> {
    match u32::try_from(quantity) {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(errors::bad_request("cantidad must be a positive integer")),
    }
}

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.trim().parse::<ProductId>().map_err(errors::domain_error_to_response)
}

fn parse_bound(
    field: &str,
    raw: &str,
    end_of_day: bool,
) -> Result<DateTime<Utc>, axum::response::Response> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let invalid = || errors::bad_request(format!("{field} must be RFC 3339 or YYYY-MM-DD"));
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc()).ok_or_else(invalid)
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(p: &Product) -> JsonValue {
    json!({
        "id": p.id_typed().to_string(),
        "nombre": p.name(),
        "imagen": p.image(),
        "stock": p.stock(),
        "precio_unitario": money_to_euros(p.unit_price()),
        "created_at": p.created_at().to_rfc3339(),
    })
}

pub fn purchase_to_json(p: &Purchase) -> JsonValue {
    json!({
        "id": p.id_typed().to_string(),
        "id_vaper": p.product_id().to_string(),
        "cantidad": p.quantity(),
        "precio_unitario": money_to_euros(p.unit_price()),
        "total": money_to_euros(p.total()),
        "fecha": p.purchased_at().to_rfc3339(),
    })
}

pub fn sale_to_json(s: &SaleRecord) -> JsonValue {
    json!({
        "id": s.id.to_string(),
        "id_vaper": s.product_id.to_string(),
        "cantidad": s.quantity,
        "precio_unitario": money_to_euros(s.unit_price),
        "total": money_to_euros(s.total),
        "cliente": s.customer,
        "fecha": s.sold_at.to_rfc3339(),
    })
}

fn sale_row_to_json(r: &SaleRow) -> JsonValue {
    json!({
        "id": r.id.to_string(),
        "cliente": r.customer,
        "id_vaper": r.product_id.to_string(),
        "producto": r.product_name,
        "cantidad": r.quantity,
        "precio_unitario": money_to_euros(r.unit_price),
        "total": money_to_euros(r.total),
        "fecha": r.sold_at.to_rfc3339(),
    })
}

pub fn stats_to_json(result: &AggregationResult) -> JsonValue {
    let s = &result.summary;
    let rows = result
        .filtered_sorted_rows
        .iter()
        .map(sale_row_to_json)
        .collect::<Vec<_>>();
    json!({
        "total_sales_count": s.total_sales_count,
        "total_units_sold": s.total_units_sold,
        "total_revenue": money_to_euros(s.total_revenue),
        "average_revenue_per_unit": money_to_euros(s.average_revenue_per_unit),
        "top_customer_by_units": s.top_customer_by_units,
        "top_customer_by_revenue": s.top_customer_by_revenue,
        "top_product_by_units": s.top_product_by_units,
        "top_product_by_revenue": s.top_product_by_revenue,
        "stock_remaining_total": s.stock_remaining_total,
        "filtered_sorted_rows": rows,
    })
}

pub fn finance_entry_to_json(e: &FinanceEntry) -> JsonValue {
    json!({
        "id": e.id.to_string(),
        "titulo": e.title,
        "precio": money_to_euros(e.amount),
        "descripcion": e.description,
        "tag": e.tag.label(),
        "mes": e.month.to_string(),
        "created_at": e.created_at.to_rfc3339(),
    })
}

fn report_line_to_json(l: &ReportLine) -> JsonValue {
    json!({
        "id": l.id,
        "titulo": l.title,
        "precio": money_to_euros(l.amount),
        "descripcion": l.description,
        "tag": l.tag,
    })
}

pub fn report_to_json(r: &MonthlyReport) -> JsonValue {
    let lines = |ls: &[ReportLine]| ls.iter().map(report_line_to_json).collect::<Vec<_>>();
    json!({
        "mes": r.month.to_string(),
        "ingresos": lines(&r.incomes),
        "gastos": lines(&r.expenses),
        "ahorros": lines(&r.savings),
        "total_ingresos": money_to_euros(r.total_income),
        "total_gastos": money_to_euros(r.total_expenses),
        "ahorro_neto": cents_to_euros(r.savings_net),
    })
}

pub fn savings_to_json(b: &SavingsBalance) -> JsonValue {
    json!({
        "por_mes": b.by_month.iter().map(|m| json!({
            "mes": m.month.to_string(),
            "neto": cents_to_euros(m.net),
        })).collect::<Vec<_>>(),
        "mes_actual": b.current_month.map(|m| m.to_string()),
        "saldo_actual": cents_to_euros(b.current),
        "mes_anterior": b.previous_month.map(|m| m.to_string()),
        "saldo_anterior": cents_to_euros(b.previous),
        "tendencia": b.trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn euros_round_to_nearest_cent() {
        assert_eq!(euros_to_money("x", 19.99).unwrap(), Money::from_cents(1999));
        assert_eq!(euros_to_money("x", 0.1 + 0.2).unwrap(), Money::from_cents(30));
        assert_eq!(euros_to_money("x", 5.0).unwrap(), Money::from_cents(500));
        assert_eq!(money_to_euros(Money::from_cents(1250)), 12.5);
    }

    #[test]
    fn negative_or_huge_amounts_are_rejected() {
        assert_eq!(euros_to_money("x", -0.01).unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert_eq!(euros_to_money("x", 1e14).unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn create_product_request_validates_like_the_form() {
        let now = Utc::now();
        let missing_name = CreateProductRequest {
            name: Some("  ".to_string()),
            image: None,
            stock: Some(1),
            unit_price: Some(5.0),
        };
        assert_eq!(missing_name.into_command(now).unwrap_err().status(), StatusCode::BAD_REQUEST);

        let negative_stock = CreateProductRequest {
            name: Some("Elf Bar".to_string()),
            image: None,
            stock: Some(-1),
            unit_price: Some(5.0),
        };
        assert!(negative_stock.into_command(now).is_err());

        let free = CreateProductRequest {
            name: Some("Elf Bar".to_string()),
            image: None,
            stock: Some(1),
            unit_price: Some(0.0),
        };
        assert!(free.into_command(now).is_err());

        let ok = CreateProductRequest {
            name: Some("Elf Bar".to_string()),
            image: None,
            stock: Some(3),
            unit_price: Some(6.5),
        }
        .into_command(now)
        .unwrap();
        assert_eq!(ok.unit_price, Money::from_cents(650));
        assert_eq!(ok.stock, 3);
    }

    #[test]
    fn sale_request_defaults_price_to_list_price() {
        let req = RecordSaleRequest {
            product_id: ProductId::new().to_string(),
            quantity: 2,
            unit_price: None,
            customer: None,
        };
        let cmd = req.into_command(Money::from_cents(700), Utc::now()).unwrap();
        assert_eq!(cmd.unit_price, Money::from_cents(700));
        assert_eq!(cmd.quantity, 2);
    }

    #[test]
    fn sale_request_rejects_non_positive_quantity() {
        let req = RecordSaleRequest {
            product_id: ProductId::new().to_string(),
            quantity: 0,
            unit_price: Some(5.0),
            customer: None,
        };
        assert!(req.into_command(Money::ZERO, Utc::now()).is_err());
    }

    #[test]
    fn stats_query_builds_view() {
        let view = StatsQuery {
            q: Some("ana".to_string()),
            sort: Some("cantidad".to_string()),
            dir: Some("asc".to_string()),
            from: Some("2025-03-01".to_string()),
            to: Some("2025-03-31".to_string()),
        }
        .into_view()
        .unwrap();

        assert_eq!(view.filter_text, "ana");
        assert_eq!(view.sort_key, SortKey::Quantity);
        assert_eq!(view.direction, SortDirection::Asc);
        assert_eq!(view.from.unwrap().to_rfc3339(), "2025-03-01T00:00:00+00:00");
        assert_eq!(view.to.unwrap().to_rfc3339(), "2025-03-31T23:59:59.999+00:00");
    }

    #[test]
    fn stats_query_defaults_and_rejects_garbage() {
        let view = StatsQuery::default().into_view().unwrap();
        assert_eq!(view, SalesView::default());

        let bad_sort = StatsQuery {
            sort: Some("colour".to_string()),
            ..StatsQuery::default()
        };
        assert_eq!(bad_sort.into_view().unwrap_err().status(), StatusCode::BAD_REQUEST);

        let bad_date = StatsQuery {
            from: Some("yesterday".to_string()),
            ..StatsQuery::default()
        };
        assert_eq!(bad_date.into_view().unwrap_err().status(), StatusCode::BAD_REQUEST);
    }
}
