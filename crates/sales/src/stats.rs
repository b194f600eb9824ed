//! Sales statistics: KPIs, rankings and the filtered/sorted sales table.
//!
//! Everything here is a pure function of its inputs. Callers own the view
//! state (filter text, sort, date range) and simply call again when it
//! changes.
//!
//! Rankings sum a metric per customer or per product and pick the largest
//! sum. When two groups tie, the group that appears first in the input wins.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use vapers_core::{DomainError, DomainResult, Money, ProductId, SaleId};
use vapers_products::{Product, ProductCatalog};

use crate::sale::SaleRecord;

/// Ranking label used when there are no sales to rank.
pub const NOT_AVAILABLE: &str = "N/A";

/// Column the sales table is ordered by.
///
/// The wire name is [`SortKey::as_str`]; parsing also accepts the English
/// column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Customer,
    Product,
    #[default]
    Date,
    Quantity,
    Total,
    UnitPrice,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Id,
        SortKey::Customer,
        SortKey::Product,
        SortKey::Date,
        SortKey::Quantity,
        SortKey::Total,
        SortKey::UnitPrice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Customer => "cliente",
            SortKey::Product => "producto",
            SortKey::Date => "fecha",
            SortKey::Quantity => "cantidad",
            SortKey::Total => "total",
            SortKey::UnitPrice => "precio_unitario",
        }
    }
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "cliente" | "customer" => Ok(SortKey::Customer),
            "producto" | "product" => Ok(SortKey::Product),
            "fecha" | "date" => Ok(SortKey::Date),
            "cantidad" | "quantity" => Ok(SortKey::Quantity),
            "total" => Ok(SortKey::Total),
            "precio_unitario" | "unit_price" => Ok(SortKey::UnitPrice),
            other => Err(DomainError::validation(format!("unknown sort key: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(DomainError::validation(format!(
                "unknown sort direction: {other}"
            ))),
        }
    }
}

/// Caller-owned view state for the statistics page.
///
/// `from`/`to` are inclusive and narrow both the KPIs and the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesView {
    pub filter_text: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SalesView {
    pub fn in_range(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// One line of the sales table, with the product name already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRow {
    pub id: SaleId,
    pub customer: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total: Money,
    pub sold_at: DateTime<Utc>,
}

impl SaleRow {
    fn new(record: &SaleRecord, product_name: String) -> Self {
        Self {
            id: record.id,
            customer: record.customer.clone(),
            product_id: record.product_id,
            product_name,
            quantity: record.quantity,
            unit_price: record.unit_price,
            total: record.total,
            sold_at: record.sold_at,
        }
    }

    /// `needle` must already be trimmed and lowercased.
    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.customer.to_lowercase().contains(needle)
            || self.product_name.to_lowercase().contains(needle)
    }
}

/// Headline numbers of the statistics page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesSummary {
    pub total_sales_count: usize,
    pub total_units_sold: u64,
    pub total_revenue: Money,
    pub average_revenue_per_unit: Money,
    pub top_customer_by_units: String,
    pub top_customer_by_revenue: String,
    pub top_product_by_units: String,
    pub top_product_by_revenue: String,
    pub stock_remaining_total: u64,
}

/// Summary plus the table rows for one [`SalesView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    pub summary: SalesSummary,
    pub filtered_sorted_rows: Vec<SaleRow>,
}

/// Reduce `sales` into KPIs and rankings.
///
/// Fails with [`DomainError::Validation`] on the first record whose stored
/// total disagrees with `quantity * unit_price`.
pub fn compute_summary(sales: &[SaleRecord], products: &[Product]) -> DomainResult<SalesSummary> {
    let catalog = ProductCatalog::new(products);
    let records: Vec<&SaleRecord> = sales.iter().collect();
    summarize_records(&records, &catalog)
}

/// Filter `sales` by customer or product name and order them by `sort_key`.
///
/// Rows with equal keys keep their input order.
pub fn filter_and_sort<F>(
    sales: &[SaleRecord],
    product_name_of: F,
    filter_text: &str,
    sort_key: SortKey,
    direction: SortDirection,
) -> Vec<SaleRow>
where
    F: Fn(&ProductId) -> String,
{
    let records: Vec<&SaleRecord> = sales.iter().collect();
    rows_for(&records, product_name_of, filter_text, sort_key, direction)
}

/// Compute the full statistics page for `view`.
pub fn summarize(
    sales: &[SaleRecord],
    products: &[Product],
    view: &SalesView,
) -> DomainResult<AggregationResult> {
    if let (Some(from), Some(to)) = (view.from, view.to) {
        if from > to {
            return Err(DomainError::validation("date range start is after its end"));
        }
    }

    let catalog = ProductCatalog::new(products);
    let records: Vec<&SaleRecord> = sales.iter().filter(|s| view.in_range(s.sold_at)).collect();

    let summary = summarize_records(&records, &catalog)?;
    let filtered_sorted_rows = rows_for(
        &records,
        |id| catalog.name_of(id).into_owned(),
        &view.filter_text,
        view.sort_key,
        view.direction,
    );

    Ok(AggregationResult {
        summary,
        filtered_sorted_rows,
    })
}

fn summarize_records(
    records: &[&SaleRecord],
    catalog: &ProductCatalog<'_>,
) -> DomainResult<SalesSummary> {
    for record in records {
        record.validate()?;
    }

    let total_units_sold: u64 = records.iter().map(|r| u64::from(r.quantity)).sum();
    let total_revenue = Money::checked_sum(records.iter().map(|r| r.total))
        .ok_or_else(|| DomainError::invariant("total revenue overflows"))?;

    let units = |r: &SaleRecord| u64::from(r.quantity);
    let revenue = |r: &SaleRecord| r.total.cents();

    let customer_label = |c: Option<&str>| c.unwrap_or(NOT_AVAILABLE).to_string();
    let product_label = |p: Option<ProductId>| match p {
        Some(id) => catalog.name_of(&id).into_owned(),
        None => NOT_AVAILABLE.to_string(),
    };

    Ok(SalesSummary {
        total_sales_count: records.len(),
        total_units_sold,
        total_revenue,
        average_revenue_per_unit: total_revenue.per_unit(total_units_sold),
        top_customer_by_units: customer_label(top_by(records, |r| r.customer.as_str(), units)),
        top_customer_by_revenue: customer_label(top_by(records, |r| r.customer.as_str(), revenue)),
        top_product_by_units: product_label(top_by(records, |r| r.product_id, units)),
        top_product_by_revenue: product_label(top_by(records, |r| r.product_id, revenue)),
        stock_remaining_total: catalog.stock_total(),
    })
}

/// Group by `key`, sum `metric`, return the key with the largest sum.
///
/// Ties go to the key seen first in `records`.
fn top_by<'r, K, F, M>(records: &[&'r SaleRecord], key: F, metric: M) -> Option<K>
where
    K: Copy + Eq + Hash,
    F: Fn(&'r SaleRecord) -> K,
    M: Fn(&SaleRecord) -> u64,
{
    let mut first_seen: Vec<K> = Vec::new();
    let mut sums: HashMap<K, u128> = HashMap::new();

    for &record in records {
        let k = key(record);
        let sum = sums.entry(k).or_insert_with(|| {
            first_seen.push(k);
            0
        });
        *sum += u128::from(metric(record));
    }

    let mut best: Option<(K, u128)> = None;
    for k in first_seen {
        let value = sums[&k];
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((k, value)),
        }
    }
    best.map(|(k, _)| k)
}

fn rows_for<F>(
    records: &[&SaleRecord],
    product_name_of: F,
    filter_text: &str,
    sort_key: SortKey,
    direction: SortDirection,
) -> Vec<SaleRow>
where
    F: Fn(&ProductId) -> String,
{
    let needle = filter_text.trim().to_lowercase();

    let mut rows: Vec<SaleRow> = records
        .iter()
        .map(|r| SaleRow::new(r, product_name_of(&r.product_id)))
        .filter(|row| row.matches(&needle))
        .collect();

    rows.sort_by(|a, b| direction.apply(compare_rows(a, b, sort_key)));
    rows
}

fn compare_rows(a: &SaleRow, b: &SaleRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Customer => compare_text(&a.customer, &b.customer),
        SortKey::Product => compare_text(&a.product_name, &b.product_name),
        SortKey::Date => a.sold_at.cmp(&b.sold_at),
        SortKey::Quantity => a.quantity.cmp(&b.quantity),
        SortKey::Total => a.total.cmp(&b.total),
        SortKey::UnitPrice => a.unit_price.cmp(&b.unit_price),
    }
}

// Case-insensitive first; byte order only separates labels differing in case.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
