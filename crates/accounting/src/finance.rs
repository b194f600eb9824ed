use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use vapers_core::{DomainError, DomainResult, Entity, FinanceEntryId, Money};

/// Ledger category of a finance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinanceTag {
    #[serde(rename = "Nómina")]
    Payroll,
    #[serde(rename = "Compra de vapers")]
    StockPurchase,
    #[serde(rename = "Gasto general")]
    GeneralExpense,
    #[serde(rename = "Gasolina")]
    Fuel,
    #[serde(rename = "Comida")]
    Food,
    #[serde(rename = "Chuches")]
    Snacks,
    #[serde(rename = "Comida a Domicilio")]
    FoodDelivery,
    #[serde(rename = "Ahorro - Ingreso")]
    SavingsDeposit,
    #[serde(rename = "Ahorro - Retiro")]
    SavingsWithdrawal,
    #[serde(rename = "Otro")]
    Other,
}

impl FinanceTag {
    pub const ALL: [FinanceTag; 10] = [
        FinanceTag::Payroll,
        FinanceTag::StockPurchase,
        FinanceTag::GeneralExpense,
        FinanceTag::Fuel,
        FinanceTag::Food,
        FinanceTag::Snacks,
        FinanceTag::FoodDelivery,
        FinanceTag::SavingsDeposit,
        FinanceTag::SavingsWithdrawal,
        FinanceTag::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FinanceTag::Payroll => "Nómina",
            FinanceTag::StockPurchase => "Compra de vapers",
            FinanceTag::GeneralExpense => "Gasto general",
            FinanceTag::Fuel => "Gasolina",
            FinanceTag::Food => "Comida",
            FinanceTag::Snacks => "Chuches",
            FinanceTag::FoodDelivery => "Comida a Domicilio",
            FinanceTag::SavingsDeposit => "Ahorro - Ingreso",
            FinanceTag::SavingsWithdrawal => "Ahorro - Retiro",
            FinanceTag::Other => "Otro",
        }
    }

    pub fn is_savings(self) -> bool {
        matches!(self, FinanceTag::SavingsDeposit | FinanceTag::SavingsWithdrawal)
    }

    pub fn is_income(self) -> bool {
        self == FinanceTag::Payroll
    }

    pub fn is_expense(self) -> bool {
        !self.is_income() && !self.is_savings()
    }
}

impl fmt::Display for FinanceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FinanceTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FinanceTag::ALL
            .into_iter()
            .find(|tag| tag.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("unknown finance tag: {wanted}")))
    }
}

/// Calendar month bucket, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(DomainError::validation(format!(
                "invalid month: {year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation(format!("month must be YYYY-MM, got {s:?}"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Month::new(year, month)
    }
}

impl TryFrom<String> for Month {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(value: Month) -> Self {
        value.to_string()
    }
}

/// One line of the personal finance ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceEntry {
    pub id: FinanceEntryId,
    pub title: String,
    pub amount: Money,
    pub description: Option<String>,
    pub tag: FinanceTag,
    pub month: Month,
    pub created_at: DateTime<Utc>,
}

/// Command: RecordFinanceEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFinanceEntry {
    pub entry_id: FinanceEntryId,
    pub title: String,
    pub amount: Money,
    pub description: Option<String>,
    pub tag: FinanceTag,
    pub occurred_at: DateTime<Utc>,
}

impl FinanceEntry {
    /// Validate the command and bucket the entry into the month it was created in.
    pub fn record(cmd: RecordFinanceEntry) -> DomainResult<Self> {
        let title = cmd.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        if cmd.amount.is_zero() {
            return Err(DomainError::validation("amount must be positive"));
        }

        let description = cmd
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            id: cmd.entry_id,
            title: title.to_string(),
            amount: cmd.amount,
            description,
            tag: cmd.tag,
            month: Month::of(cmd.occurred_at),
            created_at: cmd.occurred_at,
        })
    }

    /// Signed contribution to the savings balance, in cents.
    fn savings_delta(&self) -> i128 {
        let cents = i128::from(self.amount.cents());
        match self.tag {
            FinanceTag::SavingsDeposit => cents,
            FinanceTag::SavingsWithdrawal => -cents,
            _ => 0,
        }
    }
}

impl Entity for FinanceEntry {
    type Id = FinanceEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

pub const SALES_INCOME_LINE_ID: &str = "ventas-virtual";
pub const SALES_INCOME_TITLE: &str = "Ingresos por ventas";
pub const SALES_INCOME_DESCRIPTION: &str = "Total de ventas acumuladas";
pub const SALES_INCOME_TAG: &str = "Venta";

/// A row of the monthly report. Either a stored entry or the virtual
/// sales-income line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub id: String,
    pub title: String,
    pub amount: Money,
    pub description: Option<String>,
    pub tag: String,
}

impl From<&FinanceEntry> for ReportLine {
    fn from(entry: &FinanceEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            title: entry.title.clone(),
            amount: entry.amount,
            description: entry.description.clone(),
            tag: entry.tag.label().to_string(),
        }
    }
}

impl ReportLine {
    fn sales_income(revenue: Money) -> Self {
        Self {
            id: SALES_INCOME_LINE_ID.to_string(),
            title: SALES_INCOME_TITLE.to_string(),
            amount: revenue,
            description: Some(SALES_INCOME_DESCRIPTION.to_string()),
            tag: SALES_INCOME_TAG.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    pub month: Month,
    pub incomes: Vec<ReportLine>,
    pub expenses: Vec<ReportLine>,
    pub savings: Vec<ReportLine>,
    pub total_income: Money,
    pub total_expenses: Money,
    /// Deposits minus withdrawals for the month, in cents.
    pub savings_net: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlySavings {
    pub month: Month,
    pub net: i64,
}

/// Savings position across months.
///
/// `current` is the latest month with savings movements and `previous` the
/// one before it. Missing months count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavingsBalance {
    pub by_month: Vec<MonthlySavings>,
    pub current_month: Option<Month>,
    pub current: i64,
    pub previous_month: Option<Month>,
    pub previous: i64,
    pub trend: Trend,
}

/// Distinct months present in `entries`, newest first.
pub fn months(entries: &[FinanceEntry]) -> Vec<Month> {
    let mut months: Vec<Month> = entries.iter().map(|e| e.month).collect();
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.dedup();
    months
}

/// Split `month`'s entries into incomes, expenses and savings movements.
///
/// `sales_revenue`, when known, is added as a virtual income line.
pub fn monthly_report(
    entries: &[FinanceEntry],
    month: Month,
    sales_revenue: Option<Money>,
) -> DomainResult<MonthlyReport> {
    let in_month = || entries.iter().filter(move |e| e.month == month);

    let mut incomes: Vec<ReportLine> = in_month()
        .filter(|e| e.tag.is_income())
        .map(ReportLine::from)
        .collect();
    if let Some(revenue) = sales_revenue {
        incomes.push(ReportLine::sales_income(revenue));
    }

    let expenses: Vec<ReportLine> = in_month()
        .filter(|e| e.tag.is_expense())
        .map(ReportLine::from)
        .collect();
    let savings: Vec<ReportLine> = in_month()
        .filter(|e| e.tag.is_savings())
        .map(ReportLine::from)
        .collect();

    let total_income = sum_lines(&incomes)?;
    let total_expenses = sum_lines(&expenses)?;
    let savings_net = to_cents(in_month().map(FinanceEntry::savings_delta).sum())?;

    Ok(MonthlyReport {
        month,
        incomes,
        expenses,
        savings,
        total_income,
        total_expenses,
        savings_net,
    })
}

/// Net savings per month plus the current-vs-previous comparison.
pub fn savings_balance(entries: &[FinanceEntry]) -> DomainResult<SavingsBalance> {
    let mut per_month: BTreeMap<Month, i128> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.tag.is_savings()) {
        *per_month.entry(entry.month).or_insert(0) += entry.savings_delta();
    }

    let by_month = per_month
        .into_iter()
        .map(|(month, net)| Ok(MonthlySavings { month, net: to_cents(net)? }))
        .collect::<DomainResult<Vec<_>>>()?;

    let mut latest = by_month.iter().rev();
    let current = latest.next().copied();
    let previous = latest.next().copied();

    let current_net = current.map_or(0, |m| m.net);
    let previous_net = previous.map_or(0, |m| m.net);
    let trend = match current_net.cmp(&previous_net) {
        std::cmp::Ordering::Greater => Trend::Up,
        std::cmp::Ordering::Less => Trend::Down,
        std::cmp::Ordering::Equal => Trend::Flat,
    };

    Ok(SavingsBalance {
        current_month: current.map(|m| m.month),
        current: current_net,
        previous_month: previous.map(|m| m.month),
        previous: previous_net,
        trend,
        by_month,
    })
}

fn sum_lines(lines: &[ReportLine]) -> DomainResult<Money> {
    Money::checked_sum(lines.iter().map(|l| l.amount))
        .ok_or_else(|| DomainError::invariant("report total overflows"))
}

fn to_cents(value: i128) -> DomainResult<i64> {
    i64::try_from(value).map_err(|_| DomainError::invariant("savings balance overflows"))
}
