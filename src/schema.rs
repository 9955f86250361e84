use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one of the four logical input tables. Carried inside errors so
/// the caller knows which upload was at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Income,
    Expenses,
    Inventory,
    CashFlow,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Income => "income",
            TableKind::Expenses => "expenses",
            TableKind::Inventory => "inventory",
            TableKind::CashFlow => "cash flow",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeCategory {
    #[serde(rename = "Product Sales")]
    ProductSales,
    #[serde(rename = "Service Fees")]
    ServiceFees,
    #[serde(rename = "Interest Income")]
    InterestIncome,
    #[serde(rename = "Other Income")]
    OtherIncome,
}

impl IncomeCategory {
    pub const ALL: [IncomeCategory; 4] = [
        IncomeCategory::ProductSales,
        IncomeCategory::ServiceFees,
        IncomeCategory::InterestIncome,
        IncomeCategory::OtherIncome,
    ];
}

impl fmt::Display for IncomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IncomeCategory::ProductSales => "Product Sales",
            IncomeCategory::ServiceFees => "Service Fees",
            IncomeCategory::InterestIncome => "Interest Income",
            IncomeCategory::OtherIncome => "Other Income",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for IncomeCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Product Sales" => Ok(IncomeCategory::ProductSales),
            "Service Fees" => Ok(IncomeCategory::ServiceFees),
            "Interest Income" => Ok(IncomeCategory::InterestIncome),
            "Other Income" => Ok(IncomeCategory::OtherIncome),
            other => Err(format!("unknown income category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    #[serde(rename = "Cost of Goods Sold", alias = "COGS")]
    CostOfGoodsSold,
    #[serde(rename = "Rent")]
    Rent,
    #[serde(rename = "Salaries", alias = "Employee Salaries")]
    Salaries,
    #[serde(rename = "Utilities")]
    Utilities,
    #[serde(rename = "Marketing")]
    Marketing,
    #[serde(rename = "Supplies")]
    Supplies,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::CostOfGoodsSold,
        ExpenseCategory::Rent,
        ExpenseCategory::Salaries,
        ExpenseCategory::Utilities,
        ExpenseCategory::Marketing,
        ExpenseCategory::Supplies,
    ];
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpenseCategory::CostOfGoodsSold => "Cost of Goods Sold",
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Supplies => "Supplies",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Cost of Goods Sold" | "COGS" => Ok(ExpenseCategory::CostOfGoodsSold),
            "Rent" => Ok(ExpenseCategory::Rent),
            "Salaries" | "Employee Salaries" => Ok(ExpenseCategory::Salaries),
            "Utilities" => Ok(ExpenseCategory::Utilities),
            "Marketing" => Ok(ExpenseCategory::Marketing),
            "Supplies" => Ok(ExpenseCategory::Supplies),
            other => Err(format!("unknown expense category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    Inflow,
    Outflow,
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowType::Inflow => "Inflow",
            FlowType::Outflow => "Outflow",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FlowType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Inflow" => Ok(FlowType::Inflow),
            "Outflow" => Ok(FlowType::Outflow),
            other => Err(format!("unknown flow type '{}' (expected Inflow or Outflow)", other)),
        }
    }
}

/// One income transaction. Amounts are expected to be non-negative; the
/// pipeline does not enforce sign or range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub date: NaiveDate,
    pub category: IncomeCategory,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub amount: f64,
}

/// A stock snapshot: the quantity on hand of one product on one date,
/// together with its unit cost and selling price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub date: NaiveDate,
    pub product: String,
    pub quantity: u32,
    pub cost_price: f64,
    pub selling_price: f64,
}

impl InventoryRecord {
    /// Quantity on hand valued at unit cost.
    pub fn value(&self) -> f64 {
        f64::from(self.quantity) * self.cost_price
    }
}

/// One cash movement. The category is free-form, unlike the fixed income and
/// expense category sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRecord {
    pub date: NaiveDate,
    pub flow: FlowType,
    pub category: String,
    pub amount: f64,
}

/// The four input tables for one report-generation request. Exists only in
/// memory for the duration of the request; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub income: Vec<IncomeRecord>,
    pub expenses: Vec<ExpenseRecord>,
    pub inventory: Vec<InventoryRecord>,
    pub cash_flow: Vec<CashFlowRecord>,
}

impl Dataset {
    /// Checks that every required table has at least one row. The inventory
    /// table may be empty: its totals degrade to zero without error.
    pub fn validate(&self) -> Result<()> {
        if self.income.is_empty() {
            return Err(ReportError::EmptyDataset {
                table: TableKind::Income,
            });
        }
        if self.expenses.is_empty() {
            return Err(ReportError::EmptyDataset {
                table: TableKind::Expenses,
            });
        }
        if self.cash_flow.is_empty() {
            return Err(ReportError::EmptyDataset {
                table: TableKind::CashFlow,
            });
        }
        Ok(())
    }
}

/// The report views a presentation layer can ask for. The pipeline always
/// computes all five aggregates and charts; this only drives which charts a
/// front end chooses to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReportType {
    PnlStatement,
    CashFlowStatement,
    InventoryReport,
    CompleteFinancialReport,
}
