//! # finreport
//!
//! A library for turning transaction-level financial data (income, expenses,
//! inventory movements, cash flow) into monthly aggregated reports with
//! spreadsheet and PDF export.
//!
//! ## Core Concepts
//!
//! - **Dataset**: the four in-memory input tables for one report request
//! - **Aggregates**: month-by-category pivots plus scalar totals, recomputed
//!   from scratch on every run (nothing is cached or persisted)
//! - **Charts**: pure chart descriptions (stacked bar, line) built from the
//!   aggregates, rasterised on demand
//! - **Exports**: a multi-sheet `.xlsx` workbook and a paginated PDF, both
//!   produced in memory and written atomically
//!
//! ## Example
//!
//! ```rust,ignore
//! use finreport::{generate_report, sample_dataset};
//!
//! let dataset = sample_dataset();
//! let report = generate_report(&dataset)?;
//!
//! println!("net profit: {}", report.aggregates.net_profit());
//! report.persist_to(std::path::Path::new("out"))?;
//! ```

pub mod aggregate;
pub mod chart;
pub mod document;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod schema;
pub mod spreadsheet;
pub mod utils;

pub use aggregate::{aggregate, AggregateResult, MonthlyPivot};
pub use chart::{build_charts, render_chart, ChartKind, ChartSeries, ChartSpec, ReportCharts};
pub use error::{ReportError, Result};
pub use generator::{sample_dataset, sample_dataset_seeded};
pub use ingest::load_dataset;
pub use schema::*;
pub use utils::{format_currency, parse_any_date, Month};

use chrono::Local;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Everything one report-generation request produces: the aggregated
/// tables, the five chart artifacts, and the two exported files as byte
/// streams ready for download or persistence.
#[derive(Debug, Clone)]
pub struct Report {
    pub aggregates: AggregateResult,
    pub charts: ReportCharts,
    /// Complete `.xlsx` workbook.
    pub spreadsheet: Vec<u8>,
    /// Complete PDF document.
    pub document: Vec<u8>,
}

impl Report {
    /// Writes both exports into `dir` as `financial_report_YYYYMMDD.xlsx`
    /// and `.pdf`, each atomically, and returns the two paths. Callers
    /// wanting request-scoped output pass the path of a
    /// `tempfile::TempDir`, which removes the files when dropped.
    pub fn persist_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let stamp = Local::now().format("%Y%m%d");
        let spreadsheet_path = dir.join(format!("financial_report_{}.xlsx", stamp));
        let document_path = dir.join(format!("financial_report_{}.pdf", stamp));

        crate::utils::write_atomic(&spreadsheet_path, &self.spreadsheet).map_err(|e| {
            ReportError::Export {
                target: "spreadsheet",
                details: e.to_string(),
            }
        })?;
        crate::utils::write_atomic(&document_path, &self.document).map_err(|e| {
            ReportError::Export {
                target: "document",
                details: e.to_string(),
            }
        })?;

        Ok((spreadsheet_path, document_path))
    }
}

/// Runs the full pipeline for one dataset: validation, aggregation, chart
/// building, and both exports. Single-threaded and request-scoped; the
/// dataset is read once and nothing is retained afterwards.
pub fn generate_report(dataset: &Dataset) -> Result<Report> {
    dataset.validate()?;

    info!(
        "Generating report from {} income, {} expense, {} inventory, {} cash flow rows",
        dataset.income.len(),
        dataset.expenses.len(),
        dataset.inventory.len(),
        dataset.cash_flow.len()
    );

    let aggregates = aggregate(dataset);
    let charts = build_charts(&aggregates);

    let spreadsheet = spreadsheet::workbook_bytes(&aggregates)?;
    let document = document::document_bytes(&aggregates, &charts)?;

    debug!(
        "Report ready: {} P&L months, spreadsheet {} bytes, document {} bytes",
        aggregates.monthly_pnl.len(),
        spreadsheet.len(),
        document.len()
    );

    Ok(Report {
        aggregates,
        charts,
        spreadsheet,
        document,
    })
}
