//! Sale records and the statistics page computed from them.
//!
//! Everything here is a pure function of its inputs.

pub mod sale;
pub mod stats;

pub use sale::{RecordSale, SaleRecord, WALK_IN_CUSTOMER};
pub use stats::{
    AggregationResult, NOT_AVAILABLE, SaleRow, SalesSummary, SalesView, SortDirection, SortKey,
    compute_summary, filter_and_sort, summarize,
};
