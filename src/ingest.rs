use crate::error::{ReportError, Result};
use crate::schema::{
    CashFlowRecord, Dataset, ExpenseRecord, IncomeRecord, InventoryRecord, TableKind,
};
use crate::utils::parse_any_date;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use log::info;
use std::path::Path;

/// A parsed cell before coercion into a typed record field. Spreadsheet
/// cells keep their native date/number types; CSV cells are always text.
#[derive(Debug, Clone)]
enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn require_columns(&self, table: TableKind, names: &[&str]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                self.column(name).ok_or_else(|| {
                    ReportError::data_format(
                        table,
                        format!("required column '{}' is missing", name),
                    )
                })
            })
            .collect()
    }

    fn cell(&self, row: &[Cell], idx: usize) -> Cell {
        row.get(idx).cloned().unwrap_or(Cell::Empty)
    }
}

/// Loads all four tables and checks the required ones are non-empty, so
/// format and dataset errors surface before any aggregation starts.
pub fn load_dataset(
    income: &Path,
    expenses: &Path,
    inventory: &Path,
    cash_flow: &Path,
) -> Result<Dataset> {
    let dataset = Dataset {
        income: read_income_table(income)?,
        expenses: read_expense_table(expenses)?,
        inventory: read_inventory_table(inventory)?,
        cash_flow: read_cash_flow_table(cash_flow)?,
    };
    dataset.validate()?;
    info!(
        "Loaded dataset: {} income, {} expense, {} inventory, {} cash flow rows",
        dataset.income.len(),
        dataset.expenses.len(),
        dataset.inventory.len(),
        dataset.cash_flow.len()
    );
    Ok(dataset)
}

pub fn read_income_table(path: &Path) -> Result<Vec<IncomeRecord>> {
    let table = TableKind::Income;
    let raw = read_raw(path, table)?;
    let cols = raw.require_columns(table, &["date", "category", "amount"])?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        let line = i + 2;
        records.push(IncomeRecord {
            date: cell_date(&raw.cell(row, cols[0]), table, line)?,
            category: cell_text(&raw.cell(row, cols[1]))
                .parse()
                .map_err(|e| ReportError::data_format(table, format!("row {}: {}", line, e)))?,
            amount: cell_number(&raw.cell(row, cols[2]), table, line, "amount")?,
        });
    }
    Ok(records)
}

pub fn read_expense_table(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let table = TableKind::Expenses;
    let raw = read_raw(path, table)?;
    let cols = raw.require_columns(table, &["date", "category", "amount"])?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        let line = i + 2;
        records.push(ExpenseRecord {
            date: cell_date(&raw.cell(row, cols[0]), table, line)?,
            category: cell_text(&raw.cell(row, cols[1]))
                .parse()
                .map_err(|e| ReportError::data_format(table, format!("row {}: {}", line, e)))?,
            amount: cell_number(&raw.cell(row, cols[2]), table, line, "amount")?,
        });
    }
    Ok(records)
}

pub fn read_inventory_table(path: &Path) -> Result<Vec<InventoryRecord>> {
    let table = TableKind::Inventory;
    let raw = read_raw(path, table)?;
    let cols = raw.require_columns(
        table,
        &["date", "product", "quantity", "cost_price", "selling_price"],
    )?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        let line = i + 2;
        records.push(InventoryRecord {
            date: cell_date(&raw.cell(row, cols[0]), table, line)?,
            product: cell_text(&raw.cell(row, cols[1])),
            quantity: cell_quantity(&raw.cell(row, cols[2]), table, line)?,
            cost_price: cell_number(&raw.cell(row, cols[3]), table, line, "cost_price")?,
            selling_price: cell_number(&raw.cell(row, cols[4]), table, line, "selling_price")?,
        });
    }
    Ok(records)
}

pub fn read_cash_flow_table(path: &Path) -> Result<Vec<CashFlowRecord>> {
    let table = TableKind::CashFlow;
    let raw = read_raw(path, table)?;
    let cols = raw.require_columns(table, &["date", "type", "category", "amount"])?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        let line = i + 2;
        records.push(CashFlowRecord {
            date: cell_date(&raw.cell(row, cols[0]), table, line)?,
            flow: cell_text(&raw.cell(row, cols[1]))
                .parse()
                .map_err(|e| ReportError::data_format(table, format!("row {}: {}", line, e)))?,
            category: cell_text(&raw.cell(row, cols[2])),
            amount: cell_number(&raw.cell(row, cols[3]), table, line, "amount")?,
        });
    }
    Ok(records)
}

fn read_raw(path: &Path, table: TableKind) -> Result<RawTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "txt" => read_csv(path, table),
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path, table),
        other => Err(ReportError::data_format(
            table,
            format!("unsupported file type '{}' for {}", other, path.display()),
        )),
    }
}

fn read_csv(path: &Path, table: TableKind) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReportError::data_format(table, e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| ReportError::data_format(table, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReportError::data_format(table, e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    let field = field.trim();
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

fn read_workbook(path: &Path, table: TableKind) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ReportError::data_format(table, e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReportError::data_format(table, "workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ReportError::data_format(table, e.to_string()))?;

    let mut rows_iter = range.rows();
    let headers = rows_iter
        .next()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let rows = rows_iter
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.to_string())
            }
        }
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Cell::Date(datetime.date()),
            None => Cell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("{:?}", e)),
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => n.to_string(),
        Cell::Date(d) => d.to_string(),
        Cell::Empty => String::new(),
    }
}

fn cell_date(cell: &Cell, table: TableKind, line: usize) -> Result<NaiveDate> {
    match cell {
        Cell::Date(d) => Ok(*d),
        Cell::Text(s) => parse_any_date(s).ok_or_else(|| {
            ReportError::data_format(table, format!("row {}: unparseable date '{}'", line, s))
        }),
        Cell::Number(n) => Err(ReportError::data_format(
            table,
            format!("row {}: expected a date, found number {}", line, n),
        )),
        Cell::Empty => Err(ReportError::data_format(
            table,
            format!("row {}: date is missing", line),
        )),
    }
}

fn cell_number(cell: &Cell, table: TableKind, line: usize, field: &str) -> Result<f64> {
    match cell {
        Cell::Number(n) => Ok(*n),
        Cell::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            cleaned.parse().map_err(|_| {
                ReportError::data_format(
                    table,
                    format!("row {}: invalid {} '{}'", line, field, s),
                )
            })
        }
        Cell::Date(_) | Cell::Empty => Err(ReportError::data_format(
            table,
            format!("row {}: {} is missing", line, field),
        )),
    }
}

fn cell_quantity(cell: &Cell, table: TableKind, line: usize) -> Result<u32> {
    let value = cell_number(cell, table, line, "quantity")?;
    if value < 0.0 || value.fract().abs() > 1e-9 || value > f64::from(u32::MAX) {
        return Err(ReportError::data_format(
            table,
            format!("row {}: quantity must be a non-negative integer, got {}", line, value),
        ));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExpenseCategory, FlowType, IncomeCategory};
    use std::io::Write;
    use std::path::PathBuf;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_income_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "income.csv",
            "date,category,amount\n2023-03-15,Product Sales,1000\n03/20/2023,Service Fees,\"$2,250.75\"\n",
        );

        let records = read_income_table(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, IncomeCategory::ProductSales);
        assert!((records[0].amount - 1000.0).abs() < 1e-9);
        assert_eq!(
            records[1].date,
            NaiveDate::from_ymd_opt(2023, 3, 20).unwrap()
        );
        assert!((records[1].amount - 2250.75).abs() < 1e-9);
    }

    #[test]
    fn test_missing_column_names_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "expenses.csv",
            "day,category,amount\n2023-01-01,Rent,400\n",
        );

        let err = read_expense_table(&path).unwrap_err();
        match err {
            ReportError::DataFormat { table, details } => {
                assert_eq!(table, TableKind::Expenses);
                assert!(details.contains("'date'"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "income.csv",
            "date,category,amount\nnot-a-date,Product Sales,10\n",
        );

        let err = read_income_table(&path).unwrap_err();
        match err {
            ReportError::DataFormat { table, details } => {
                assert_eq!(table, TableKind::Income);
                assert!(details.contains("row 2"));
                assert!(details.contains("not-a-date"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "expenses.csv",
            "date,category,amount\n2023-01-01,Bribes,400\n",
        );

        assert!(matches!(
            read_expense_table(&path).unwrap_err(),
            ReportError::DataFormat {
                table: TableKind::Expenses,
                ..
            }
        ));
    }

    #[test]
    fn test_expense_alias_headers_and_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "expenses.csv",
            "Date,Category,Amount\n2023-06-01,Employee Salaries,5000\n2023-06-02,COGS,120\n",
        );

        let records = read_expense_table(&path).unwrap();
        assert_eq!(records[0].category, ExpenseCategory::Salaries);
        assert_eq!(records[1].category, ExpenseCategory::CostOfGoodsSold);
    }

    #[test]
    fn test_cash_flow_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "cash.csv",
            "date,type,category,amount\n2023-02-01,Inflow,Product Sales,900\n2023-02-02,Outflow,Rent,350\n",
        );

        let records = read_cash_flow_table(&path).unwrap();
        assert_eq!(records[0].flow, FlowType::Inflow);
        assert_eq!(records[1].flow, FlowType::Outflow);
        assert_eq!(records[1].category, "Rent");
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "inventory.csv",
            "date,product,quantity,cost_price,selling_price\n2023-01-01,Product A,3.5,10,20\n",
        );

        assert!(matches!(
            read_inventory_table(&path).unwrap_err(),
            ReportError::DataFormat {
                table: TableKind::Inventory,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_income_table(Path::new("income.parquet")).unwrap_err();
        assert!(matches!(err, ReportError::DataFormat { .. }));
    }

    #[test]
    fn test_load_dataset_rejects_empty_required_table() {
        let dir = tempfile::tempdir().unwrap();
        let income = write_csv(dir.path(), "income.csv", "date,category,amount\n");
        let expenses = write_csv(
            dir.path(),
            "expenses.csv",
            "date,category,amount\n2023-01-01,Rent,400\n",
        );
        let inventory = write_csv(
            dir.path(),
            "inventory.csv",
            "date,product,quantity,cost_price,selling_price\n",
        );
        let cash = write_csv(
            dir.path(),
            "cash.csv",
            "date,type,category,amount\n2023-01-01,Inflow,Sales,100\n",
        );

        let err = load_dataset(&income, &expenses, &inventory, &cash).unwrap_err();
        assert!(matches!(
            err,
            ReportError::EmptyDataset {
                table: TableKind::Income
            }
        ));
    }
}
