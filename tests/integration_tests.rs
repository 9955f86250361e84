use chrono::NaiveDate;
use finreport::*;
use std::io::Write;
use std::path::{Path, PathBuf};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_full_pipeline_on_sample_data() {
    let dataset = sample_dataset();
    let report = generate_report(&dataset).unwrap();

    // Twelve months of 2023 in every view.
    assert_eq!(report.aggregates.monthly_pnl.len(), 12);
    assert_eq!(report.aggregates.monthly_income.len(), 12);
    assert_eq!(report.aggregates.monthly_cash_flow.len(), 12);

    // Pivot totals reconcile with the raw scalar totals.
    let aggregates = &report.aggregates;
    assert!(
        (aggregates.monthly_income.grand_total() - aggregates.total_income).abs() < 1e-6,
        "income pivot should sum to total_income"
    );
    assert!(
        (aggregates.monthly_expenses.grand_total() - aggregates.total_expenses).abs() < 1e-6,
        "expense pivot should sum to total_expenses"
    );

    // P&L identity per month.
    for (month, pnl) in &aggregates.monthly_pnl {
        let expected = aggregates.monthly_income.row_total(*month)
            - aggregates.monthly_expenses.row_total(*month);
        assert!(
            (pnl - expected).abs() < 1e-6,
            "P&L mismatch for {}: {} vs {}",
            month,
            pnl,
            expected
        );
    }

    // Net column identity per month.
    let cash = &aggregates.monthly_cash_flow;
    for month in cash.months().collect::<Vec<_>>() {
        let net = cash.value(month, "Inflow") - cash.value(month, "Outflow");
        assert!((cash.value(month, "Net") - net).abs() < 1e-6);
    }

    // Both export streams are structurally valid containers.
    assert_eq!(&report.spreadsheet[..4], b"PK\x03\x04");
    assert_eq!(&report.document[..5], b"%PDF-");
}

#[test]
fn test_sample_data_is_reproducible_across_runs() {
    let first = aggregate(&sample_dataset());
    let second = aggregate(&sample_dataset());
    assert_eq!(first, second);
}

#[test]
fn test_aggregation_is_bit_stable() {
    let dataset = sample_dataset();
    assert_eq!(aggregate(&dataset), aggregate(&dataset));
}

#[test]
fn test_known_scenario_march_2023() {
    let dataset = Dataset {
        income: vec![IncomeRecord {
            date: date(2023, 3, 15),
            category: IncomeCategory::ProductSales,
            amount: 1000.0,
        }],
        expenses: vec![ExpenseRecord {
            date: date(2023, 3, 15),
            category: ExpenseCategory::Rent,
            amount: 400.0,
        }],
        cash_flow: vec![CashFlowRecord {
            date: date(2023, 3, 15),
            flow: FlowType::Inflow,
            category: "Product Sales".to_string(),
            amount: 1000.0,
        }],
        inventory: Vec::new(),
    };

    let report = generate_report(&dataset).unwrap();
    let aggregates = &report.aggregates;

    assert!((aggregates.total_income - 1000.0).abs() < 1e-9);
    assert!((aggregates.total_expenses - 400.0).abs() < 1e-9);
    assert!((aggregates.total_inventory_value - 0.0).abs() < 1e-9);

    let march = Month::parse("2023-03").unwrap();
    assert!((aggregates.monthly_pnl[&march] - 600.0).abs() < 1e-9);
}

#[test]
fn test_csv_ingestion_end_to_end() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let income = write_csv(
        dir.path(),
        "income.csv",
        "date,category,amount\n\
         2023-01-10,Product Sales,1500\n\
         2023-01-25,Service Fees,300\n\
         2023-02-14,Interest Income,42.50\n",
    );
    let expenses = write_csv(
        dir.path(),
        "expenses.csv",
        "date,category,amount\n\
         2023-01-05,Rent,800\n\
         2023-02-01,Employee Salaries,2100\n",
    );
    let inventory = write_csv(
        dir.path(),
        "inventory.csv",
        "date,product,quantity,cost_price,selling_price\n\
         2023-01-31,Product A,10,12.50,20\n\
         2023-02-28,Product B,3,100,150\n",
    );
    let cash_flow = write_csv(
        dir.path(),
        "cash_flow.csv",
        "date,type,category,amount\n\
         2023-01-10,Inflow,Product Sales,1500\n\
         2023-01-20,Outflow,Rent,800\n\
         2023-02-01,Outflow,Employee Salaries,2100\n",
    );

    let dataset = load_dataset(&income, &expenses, &inventory, &cash_flow)?;
    let report = generate_report(&dataset)?;
    let aggregates = &report.aggregates;

    assert!((aggregates.total_income - 1842.5).abs() < 1e-9);
    assert!((aggregates.total_expenses - 2900.0).abs() < 1e-9);
    assert!((aggregates.total_inventory_value - 425.0).abs() < 1e-9);

    let january = Month::parse("2023-01").unwrap();
    assert!((aggregates.monthly_pnl[&january] - 1000.0).abs() < 1e-9);
    assert!((aggregates.monthly_cash_flow.value(january, "Net") - 700.0).abs() < 1e-9);

    // The expense pivot uses canonical category names.
    let february = Month::parse("2023-02").unwrap();
    assert!((aggregates.monthly_expenses.value(february, "Salaries") - 2100.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_spreadsheet_round_trip_through_ingest() {
    // Write an income table as a real workbook, then read it back with the
    // spreadsheet loader.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("income.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "date").unwrap();
    sheet.write_string(0, 1, "category").unwrap();
    sheet.write_string(0, 2, "amount").unwrap();
    sheet.write_string(1, 0, "2023-03-15").unwrap();
    sheet.write_string(1, 1, "Product Sales").unwrap();
    sheet.write_number(1, 2, 1000.0).unwrap();
    sheet.write_string(2, 0, "2023-04-01").unwrap();
    sheet.write_string(2, 1, "Other Income").unwrap();
    sheet.write_number(2, 2, 250.25).unwrap();
    workbook.save(&path).unwrap();

    let records = ingest::read_income_table(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date, date(2023, 3, 15));
    assert_eq!(records[0].category, IncomeCategory::ProductSales);
    assert!((records[1].amount - 250.25).abs() < 1e-9);
}

#[test]
fn test_pivot_is_total_over_observed_categories() {
    let dataset = Dataset {
        income: vec![
            IncomeRecord {
                date: date(2023, 1, 1),
                category: IncomeCategory::ProductSales,
                amount: 10.0,
            },
            IncomeRecord {
                date: date(2023, 6, 1),
                category: IncomeCategory::InterestIncome,
                amount: 5.0,
            },
        ],
        ..Default::default()
    };

    let pivot = aggregate(&dataset).monthly_income;
    for month in pivot.months().collect::<Vec<_>>() {
        let row = pivot.row(month).unwrap();
        assert_eq!(
            row.len(),
            pivot.columns().len(),
            "every month must have a value for every observed category"
        );
    }
    assert_eq!(
        pivot.value(Month::parse("2023-06").unwrap(), "Product Sales"),
        0.0
    );
}

#[test]
fn test_exports_fail_independently() {
    // A directory that does not exist breaks the spreadsheet write but must
    // not stop the document write.
    let aggregates = aggregate(&sample_dataset());
    let charts = build_charts(&aggregates);

    let missing = Path::new("/nonexistent/finreport/out.xlsx");
    let err = spreadsheet::write_workbook(&aggregates, missing).unwrap_err();
    assert!(matches!(
        err,
        ReportError::Export {
            target: "spreadsheet",
            ..
        }
    ));

    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("report.pdf");
    document::write_document(&aggregates, &charts, &pdf).unwrap();
    assert!(pdf.exists());
}

#[test]
fn test_failed_export_leaves_no_partial_file() {
    let aggregates = aggregate(&sample_dataset());
    let target = Path::new("/nonexistent/finreport/out.xlsx");
    assert!(spreadsheet::write_workbook(&aggregates, target).is_err());
    assert!(!target.exists());
}

#[test]
fn test_all_zero_aggregates_export_valid_files() {
    let dataset = Dataset {
        income: vec![IncomeRecord {
            date: date(2023, 1, 1),
            category: IncomeCategory::ProductSales,
            amount: 0.0,
        }],
        expenses: vec![ExpenseRecord {
            date: date(2023, 1, 1),
            category: ExpenseCategory::Rent,
            amount: 0.0,
        }],
        cash_flow: vec![CashFlowRecord {
            date: date(2023, 1, 1),
            flow: FlowType::Outflow,
            category: "Rent".to_string(),
            amount: 0.0,
        }],
        inventory: Vec::new(),
    };

    let report = generate_report(&dataset).unwrap();
    assert!((report.aggregates.total_income - 0.0).abs() < 1e-9);
    assert_eq!(&report.spreadsheet[..4], b"PK\x03\x04");
    assert_eq!(&report.document[..5], b"%PDF-");
}

#[test]
fn test_report_type_selection_is_presentation_only() {
    let report = generate_report(&sample_dataset()).unwrap();
    let charts = &report.charts;

    // Every report type draws from the same five precomputed charts.
    assert_eq!(
        charts.for_report(ReportType::PnlStatement)[0].title,
        "Monthly Profit & Loss"
    );
    assert_eq!(
        charts.for_report(ReportType::CashFlowStatement)[0].title,
        "Monthly Cash Flow"
    );
    assert_eq!(
        charts.for_report(ReportType::InventoryReport)[0].title,
        "Monthly Inventory Value by Product"
    );
    assert_eq!(
        charts
            .for_report(ReportType::CompleteFinancialReport)
            .len(),
        5
    );
}
