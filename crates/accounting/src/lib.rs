//! Personal finance ledger: entries, monthly reports and savings.

pub mod finance;

pub use finance::{
    FinanceEntry, FinanceTag, Month, MonthlyReport, MonthlySavings, RecordFinanceEntry,
    ReportLine, SALES_INCOME_LINE_ID, SALES_INCOME_TITLE, SavingsBalance, Trend, monthly_report,
    months, savings_balance,
};
