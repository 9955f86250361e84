use crate::schema::{
    CashFlowRecord, Dataset, ExpenseCategory, ExpenseRecord, FlowType, IncomeCategory,
    IncomeRecord, InventoryRecord,
};
use chrono::{Datelike, NaiveDate, Weekday};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const DEFAULT_SEED: u64 = 42;

const PRODUCTS: [&str; 5] = [
    "Product A",
    "Product B",
    "Product C",
    "Product D",
    "Product E",
];

const CASH_FLOW_CATEGORIES: [&str; 5] = [
    "Product Sales",
    "Investments",
    "Loan Repayment",
    "Rent",
    "Employee Salaries",
];

/// Generates the demonstration dataset: one row per table per day of
/// calendar year 2023, with a fixed seed so the preview is identical on
/// every run.
pub fn sample_dataset() -> Dataset {
    sample_dataset_seeded(DEFAULT_SEED)
}

/// Seeded variant of [`sample_dataset`]. The amounts carry cosmetic business
/// texture (quiet weekends, a holiday-season income bump, year-end expense
/// spike); nothing downstream depends on that shape.
pub fn sample_dataset_seeded(seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = Normal::new(1.0, 0.05).unwrap();

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

    let mut dataset = Dataset::default();

    for date in start.iter_days().take_while(|d| *d <= end) {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);

        let mut income_amount = rng.gen_range(500.0..20_000.0) * jitter.sample(&mut rng);
        if weekend {
            income_amount *= 0.2;
        }
        if matches!(date.month(), 11 | 12 | 1) {
            income_amount *= 1.5;
        }
        let category = IncomeCategory::ALL[rng.gen_range(0..IncomeCategory::ALL.len())];
        dataset.income.push(IncomeRecord {
            date,
            category,
            amount: round_cents(income_amount),
        });

        let mut expense_amount = rng.gen_range(300.0..15_000.0) * jitter.sample(&mut rng);
        if weekend {
            expense_amount *= 0.2;
        }
        if date.month() == 12 {
            expense_amount *= 1.3;
        }
        let category = ExpenseCategory::ALL[rng.gen_range(0..ExpenseCategory::ALL.len())];
        dataset.expenses.push(ExpenseRecord {
            date,
            category,
            amount: round_cents(expense_amount),
        });

        dataset.inventory.push(InventoryRecord {
            date,
            product: PRODUCTS[rng.gen_range(0..PRODUCTS.len())].to_string(),
            quantity: rng.gen_range(50..500),
            cost_price: f64::from(rng.gen_range(10..100)),
            selling_price: f64::from(rng.gen_range(50..200)),
        });

        let mut flow_amount = rng.gen_range(500.0..20_000.0) * jitter.sample(&mut rng);
        if weekend {
            flow_amount *= 0.2;
        }
        let flow = if rng.gen_bool(0.5) {
            FlowType::Inflow
        } else {
            FlowType::Outflow
        };
        dataset.cash_flow.push(CashFlowRecord {
            date,
            flow,
            category: CASH_FLOW_CATEGORIES[rng.gen_range(0..CASH_FLOW_CATEGORIES.len())]
                .to_string(),
            amount: round_cents(flow_amount),
        });
    }

    debug!(
        "Generated sample dataset with {} rows per table (seed {})",
        dataset.income.len(),
        seed
    );

    dataset
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
