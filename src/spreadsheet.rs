use crate::aggregate::{AggregateResult, MonthlyPivot};
use crate::error::{ReportError, Result};
use crate::utils::write_atomic;
use log::info;
use rust_xlsxwriter::{Chart, ChartType, Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

const TARGET: &str = "spreadsheet";

fn xlsx_err(e: XlsxError) -> ReportError {
    ReportError::Export {
        target: TARGET,
        details: e.to_string(),
    }
}

/// Serialises the aggregates into a multi-sheet `.xlsx` workbook, entirely
/// in memory. Sheet order: Summary, Income, Expenses, P&L, Inventory,
/// Cash Flow. The Summary sheet embeds a P&L line chart and an income
/// column chart that reference the data sheets by cell range.
pub fn workbook_bytes(aggregates: &AggregateResult) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("$#,##0.00");

    write_summary_sheet(&mut workbook, aggregates, &bold, &money)?;
    write_pivot_sheet(
        workbook.add_worksheet(),
        "Income",
        &aggregates.monthly_income,
        &bold,
    )?;
    write_pivot_sheet(
        workbook.add_worksheet(),
        "Expenses",
        &aggregates.monthly_expenses,
        &bold,
    )?;
    write_pnl_sheet(workbook.add_worksheet(), aggregates, &bold)?;
    write_pivot_sheet(
        workbook.add_worksheet(),
        "Inventory",
        &aggregates.monthly_inventory_value,
        &bold,
    )?;
    write_pivot_sheet(
        workbook.add_worksheet(),
        "Cash Flow",
        &aggregates.monthly_cash_flow,
        &bold,
    )?;

    insert_summary_charts(&mut workbook, aggregates)?;

    let bytes = workbook.save_to_buffer().map_err(xlsx_err)?;
    info!("Built spreadsheet report ({} bytes)", bytes.len());
    Ok(bytes)
}

/// Builds the workbook and writes it atomically: the target path only ever
/// holds a complete file.
pub fn write_workbook(aggregates: &AggregateResult, path: &Path) -> Result<()> {
    let bytes = workbook_bytes(aggregates)?;
    write_atomic(path, &bytes).map_err(|e| ReportError::Export {
        target: TARGET,
        details: e.to_string(),
    })
}

fn write_summary_sheet(
    workbook: &mut Workbook,
    aggregates: &AggregateResult,
    bold: &Format,
    money: &Format,
) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary").map_err(xlsx_err)?;
    sheet.write_string_with_format(0, 0, "Metric", bold).map_err(xlsx_err)?;
    sheet.write_string_with_format(0, 1, "Amount", bold).map_err(xlsx_err)?;

    let metrics = [
        ("Total Income", aggregates.total_income),
        ("Total Expenses", aggregates.total_expenses),
        ("Net Profit", aggregates.net_profit()),
        ("Total Inventory Value", aggregates.total_inventory_value),
    ];
    for (i, (name, value)) in metrics.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, *name).map_err(xlsx_err)?;
        sheet
            .write_number_with_format(row, 1, *value, money)
            .map_err(xlsx_err)?;
    }
    sheet.set_column_width(0, 24).map_err(xlsx_err)?;
    sheet.set_column_width(1, 16).map_err(xlsx_err)?;
    Ok(())
}

fn write_pivot_sheet(
    sheet: &mut Worksheet,
    name: &str,
    pivot: &MonthlyPivot,
    bold: &Format,
) -> Result<()> {
    sheet.set_name(name).map_err(xlsx_err)?;
    sheet.write_string_with_format(0, 0, "Month", bold).map_err(xlsx_err)?;
    for (c, column) in pivot.columns().iter().enumerate() {
        sheet
            .write_string_with_format(0, (c + 1) as u16, column, bold)
            .map_err(xlsx_err)?;
    }

    for (r, month) in pivot.months().enumerate() {
        let row = (r + 1) as u32;
        sheet
            .write_string(row, 0, month.to_string())
            .map_err(xlsx_err)?;
        if let Some(values) = pivot.row(month) {
            for (c, value) in values.iter().enumerate() {
                sheet
                    .write_number(row, (c + 1) as u16, *value)
                    .map_err(xlsx_err)?;
            }
        }
    }
    sheet.set_column_width(0, 12).map_err(xlsx_err)?;
    Ok(())
}

fn write_pnl_sheet(
    sheet: &mut Worksheet,
    aggregates: &AggregateResult,
    bold: &Format,
) -> Result<()> {
    sheet.set_name("P&L").map_err(xlsx_err)?;
    sheet.write_string_with_format(0, 0, "Month", bold).map_err(xlsx_err)?;
    sheet
        .write_string_with_format(0, 1, "Net Profit", bold)
        .map_err(xlsx_err)?;

    for (r, (month, value)) in aggregates.monthly_pnl.iter().enumerate() {
        let row = (r + 1) as u32;
        sheet
            .write_string(row, 0, month.to_string())
            .map_err(xlsx_err)?;
        sheet.write_number(row, 1, *value).map_err(xlsx_err)?;
    }
    sheet.set_column_width(0, 12).map_err(xlsx_err)?;
    Ok(())
}

fn insert_summary_charts(workbook: &mut Workbook, aggregates: &AggregateResult) -> Result<()> {
    let pnl_rows = aggregates.monthly_pnl.len() as u32;
    let income_rows = aggregates.monthly_income.len() as u32;

    let summary = workbook.worksheet_from_name("Summary").map_err(xlsx_err)?;

    if pnl_rows > 0 {
        let mut chart = Chart::new(ChartType::Line);
        chart
            .add_series()
            .set_categories(("P&L", 1, 0, pnl_rows, 0))
            .set_values(("P&L", 1, 1, pnl_rows, 1))
            .set_name("Net Profit");
        chart.title().set_name("Monthly Profit & Loss");
        chart.x_axis().set_name("Month");
        chart.y_axis().set_name("Net Profit ($)");
        summary.insert_chart(1, 3, &chart).map_err(xlsx_err)?;
    }

    if income_rows > 0 {
        let mut chart = Chart::new(ChartType::Column);
        for (c, column) in aggregates.monthly_income.columns().iter().enumerate() {
            let col = (c + 1) as u16;
            chart
                .add_series()
                .set_categories(("Income", 1, 0, income_rows, 0))
                .set_values(("Income", 1, col, income_rows, col))
                .set_name(column);
        }
        chart.title().set_name("Monthly Income by Category");
        chart.x_axis().set_name("Month");
        chart.y_axis().set_name("Amount ($)");
        summary.insert_chart(17, 3, &chart).map_err(xlsx_err)?;
    }

    Ok(())
}
