//! Finance ledger service over a repository of entries.

use vapers_accounting::{
    FinanceEntry, Month, MonthlyReport, RecordFinanceEntry, SavingsBalance, monthly_report, months,
    savings_balance,
};
use vapers_core::{DomainResult, FinanceEntryId, Money};

use crate::store::{InMemoryRepository, Repository};

pub type InMemoryFinanceLedger = FinanceLedger<InMemoryRepository<FinanceEntryId, FinanceEntry>>;

#[derive(Debug)]
pub struct FinanceLedger<R>
where
    R: Repository<FinanceEntryId, FinanceEntry>,
{
    entries: R,
}

impl InMemoryFinanceLedger {
    pub fn in_memory() -> Self {
        Self::new(InMemoryRepository::new())
    }
}

impl<R> FinanceLedger<R>
where
    R: Repository<FinanceEntryId, FinanceEntry>,
{
    pub fn new(entries: R) -> Self {
        Self { entries }
    }

    pub fn record(&self, cmd: RecordFinanceEntry) -> DomainResult<FinanceEntry> {
        let entry = FinanceEntry::record(cmd)?;
        self.entries.add(entry.clone())?;

        tracing::info!(
            entry_id = %entry.id,
            tag = %entry.tag,
            month = %entry.month,
            "finance entry recorded"
        );
        Ok(entry)
    }

    pub fn entries(&self) -> DomainResult<Vec<FinanceEntry>> {
        self.entries.list()
    }

    pub fn months(&self) -> DomainResult<Vec<Month>> {
        Ok(months(&self.entries()?))
    }

    pub fn report(
        &self,
        month: Month,
        sales_revenue: Option<Money>,
    ) -> DomainResult<MonthlyReport> {
        monthly_report(&self.entries()?, month, sales_revenue)
    }

    pub fn savings(&self) -> DomainResult<SavingsBalance> {
        savings_balance(&self.entries()?)
    }
}
