use crate::schema::{CashFlowRecord, Dataset, FlowType};
use crate::utils::Month;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A month-by-category matrix of summed amounts. Every row carries a value
/// for every column: categories unobserved in a month are explicit zeros, so
/// downstream consumers never have to handle missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPivot {
    columns: Vec<String>,
    rows: BTreeMap<Month, Vec<f64>>,
}

impl MonthlyPivot {
    fn from_entries(entries: impl IntoIterator<Item = (Month, String, f64)>) -> Self {
        let mut cells: BTreeMap<Month, BTreeMap<String, f64>> = BTreeMap::new();
        let mut columns: BTreeSet<String> = BTreeSet::new();

        for (month, column, value) in entries {
            *cells
                .entry(month)
                .or_default()
                .entry(column.clone())
                .or_insert(0.0) += value;
            columns.insert(column);
        }

        let columns: Vec<String> = columns.into_iter().collect();
        let rows = cells
            .into_iter()
            .map(|(month, row)| {
                let values = columns
                    .iter()
                    .map(|c| row.get(c).copied().unwrap_or(0.0))
                    .collect();
                (month, values)
            })
            .collect();

        Self { columns, rows }
    }

    /// Column headers, sorted alphabetically.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Months with at least one observation, in chronological order.
    pub fn months(&self) -> impl Iterator<Item = Month> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, month: Month) -> Option<&[f64]> {
        self.rows.get(&month).map(Vec::as_slice)
    }

    pub fn value(&self, month: Month, column: &str) -> f64 {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return 0.0;
        };
        self.rows.get(&month).map_or(0.0, |row| row[idx])
    }

    /// Sum of all columns for one month; zero for unknown months.
    pub fn row_total(&self, month: Month) -> f64 {
        self.rows
            .get(&month)
            .map_or(0.0, |row| row.iter().sum())
    }

    pub fn grand_total(&self) -> f64 {
        self.rows.values().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// All monthly views plus the scalar totals, recomputed from scratch on
/// every call. See [`aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub monthly_income: MonthlyPivot,
    pub monthly_expenses: MonthlyPivot,
    pub monthly_pnl: BTreeMap<Month, f64>,
    pub monthly_inventory_value: MonthlyPivot,
    /// Columns are always `[Inflow, Outflow, Net]`.
    pub monthly_cash_flow: MonthlyPivot,
    pub total_income: f64,
    pub total_expenses: f64,
    /// Valuation over the full raw inventory table. This is intentionally
    /// not constrained to equal the sum of the monthly pivot.
    pub total_inventory_value: f64,
}

impl AggregateResult {
    pub fn net_profit(&self) -> f64 {
        self.total_income - self.total_expenses
    }
}

/// Groups the four tables into monthly pivots and computes the derived
/// metrics. Pure and deterministic: the same dataset always produces an
/// identical result. Amounts are summed as given; nothing here validates
/// sign or range, and nothing here divides.
pub fn aggregate(data: &Dataset) -> AggregateResult {
    let monthly_income = MonthlyPivot::from_entries(
        data.income
            .iter()
            .map(|r| (Month::of(r.date), r.category.to_string(), r.amount)),
    );
    let total_income: f64 = data.income.iter().map(|r| r.amount).sum();

    let monthly_expenses = MonthlyPivot::from_entries(
        data.expenses
            .iter()
            .map(|r| (Month::of(r.date), r.category.to_string(), r.amount)),
    );
    let total_expenses: f64 = data.expenses.iter().map(|r| r.amount).sum();

    let pnl_months: BTreeSet<Month> = monthly_income
        .months()
        .chain(monthly_expenses.months())
        .collect();
    let monthly_pnl: BTreeMap<Month, f64> = pnl_months
        .into_iter()
        .map(|m| {
            (
                m,
                monthly_income.row_total(m) - monthly_expenses.row_total(m),
            )
        })
        .collect();

    let monthly_inventory_value = MonthlyPivot::from_entries(
        data.inventory
            .iter()
            .map(|r| (Month::of(r.date), r.product.clone(), r.value())),
    );
    let total_inventory_value: f64 = data.inventory.iter().map(|r| r.value()).sum();

    let monthly_cash_flow = cash_flow_pivot(&data.cash_flow);

    debug!(
        "Aggregated {} income, {} expense, {} inventory and {} cash flow rows across {} P&L months",
        data.income.len(),
        data.expenses.len(),
        data.inventory.len(),
        data.cash_flow.len(),
        monthly_pnl.len()
    );

    AggregateResult {
        monthly_income,
        monthly_expenses,
        monthly_pnl,
        monthly_inventory_value,
        monthly_cash_flow,
        total_income,
        total_expenses,
        total_inventory_value,
    }
}

/// Pivots cash movements into fixed `[Inflow, Outflow, Net]` columns with
/// `Net = Inflow - Outflow` per month.
fn cash_flow_pivot(records: &[CashFlowRecord]) -> MonthlyPivot {
    let mut cells: BTreeMap<Month, (f64, f64)> = BTreeMap::new();
    for record in records {
        let entry = cells.entry(Month::of(record.date)).or_insert((0.0, 0.0));
        match record.flow {
            FlowType::Inflow => entry.0 += record.amount,
            FlowType::Outflow => entry.1 += record.amount,
        }
    }

    let rows = cells
        .into_iter()
        .map(|(month, (inflow, outflow))| (month, vec![inflow, outflow, inflow - outflow]))
        .collect();

    MonthlyPivot {
        columns: vec![
            "Inflow".to_string(),
            "Outflow".to_string(),
            "Net".to_string(),
        ],
        rows,
    }
}
