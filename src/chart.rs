use crate::aggregate::{AggregateResult, MonthlyPivot};
use crate::error::{ReportError, Result};
use crate::schema::ReportType;
use crate::utils::Month;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    StackedBar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    /// One value per entry of [`ChartSpec::categories`], in the same order.
    pub values: Vec<f64>,
}

/// A renderable chart artifact: a pure description of what to plot. Titles
/// and axis labels travel here rather than being baked into the bitmap, so
/// consumers (PDF exporter, UI) typeset them with their own fonts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    /// Month labels along the x axis, chronological.
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// The five chart artifacts of a full report, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportCharts {
    pub income: ChartSpec,
    pub expenses: ChartSpec,
    pub pnl: ChartSpec,
    pub inventory: ChartSpec,
    pub cash_flow: ChartSpec,
}

impl ReportCharts {
    pub fn all(&self) -> [&ChartSpec; 5] {
        [
            &self.income,
            &self.expenses,
            &self.pnl,
            &self.inventory,
            &self.cash_flow,
        ]
    }

    /// The charts a presentation layer shows for the selected report type.
    /// Purely a display choice; all five are always computed.
    pub fn for_report(&self, report: ReportType) -> Vec<&ChartSpec> {
        match report {
            ReportType::PnlStatement => vec![&self.pnl],
            ReportType::CashFlowStatement => vec![&self.cash_flow],
            ReportType::InventoryReport => vec![&self.inventory],
            ReportType::CompleteFinancialReport => self.all().to_vec(),
        }
    }
}

/// Builds all five chart specs from the aggregated tables. Pure function,
/// no I/O.
pub fn build_charts(aggregates: &AggregateResult) -> ReportCharts {
    ReportCharts {
        income: stacked_bar_chart(
            "Monthly Income by Category",
            "Amount ($)",
            &aggregates.monthly_income,
        ),
        expenses: stacked_bar_chart(
            "Monthly Expenses by Category",
            "Amount ($)",
            &aggregates.monthly_expenses,
        ),
        pnl: pnl_chart(&aggregates.monthly_pnl),
        inventory: stacked_bar_chart(
            "Monthly Inventory Value by Product",
            "Inventory Value ($)",
            &aggregates.monthly_inventory_value,
        ),
        cash_flow: line_chart_from_pivot(
            "Monthly Cash Flow",
            "Amount ($)",
            &aggregates.monthly_cash_flow,
        ),
    }
}

fn stacked_bar_chart(title: &str, y_label: &str, pivot: &MonthlyPivot) -> ChartSpec {
    ChartSpec {
        title: title.to_string(),
        x_label: "Month".to_string(),
        y_label: y_label.to_string(),
        kind: ChartKind::StackedBar,
        categories: pivot.months().map(|m| m.to_string()).collect(),
        series: pivot_series(pivot),
    }
}

fn line_chart_from_pivot(title: &str, y_label: &str, pivot: &MonthlyPivot) -> ChartSpec {
    ChartSpec {
        title: title.to_string(),
        x_label: "Month".to_string(),
        y_label: y_label.to_string(),
        kind: ChartKind::Line,
        categories: pivot.months().map(|m| m.to_string()).collect(),
        series: pivot_series(pivot),
    }
}

fn pnl_chart(pnl: &BTreeMap<Month, f64>) -> ChartSpec {
    ChartSpec {
        title: "Monthly Profit & Loss".to_string(),
        x_label: "Month".to_string(),
        y_label: "Net Profit ($)".to_string(),
        kind: ChartKind::Line,
        categories: pnl.keys().map(|m| m.to_string()).collect(),
        series: vec![ChartSeries {
            name: "Net Profit".to_string(),
            values: pnl.values().copied().collect(),
        }],
    }
}

fn pivot_series(pivot: &MonthlyPivot) -> Vec<ChartSeries> {
    pivot
        .columns()
        .iter()
        .map(|column| ChartSeries {
            name: column.clone(),
            values: pivot.months().map(|m| pivot.value(m, column)).collect(),
        })
        .collect()
}

/// An RGB8 bitmap produced from a [`ChartSpec`].
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl RenderedChart {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&self.pixels, self.width, self.height, ColorType::Rgb8)
            .map_err(|e| ReportError::Chart(e.to_string()))?;
        Ok(out)
    }
}

const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

fn chart_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Rasterises a chart spec into an RGB bitmap. Only plot geometry is drawn;
/// text stays on the spec (see [`ChartSpec`]).
pub fn render_chart(spec: &ChartSpec, width: u32, height: u32) -> Result<RenderedChart> {
    if width == 0 || height == 0 {
        return Err(ReportError::Chart(format!(
            "invalid chart dimensions {}x{}",
            width, height
        )));
    }

    let mut pixels = vec![255u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let n = spec.categories.len();
        let (y_min, y_max) = value_range(spec);
        let x_min = -0.6;
        let x_max = n as f64 - 0.4;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(chart_err)?;

        match spec.kind {
            ChartKind::StackedBar => {
                let mut base = vec![0.0f64; n];
                for (si, series) in spec.series.iter().enumerate() {
                    let style = PALETTE[si % PALETTE.len()].filled();
                    let mut bars = Vec::with_capacity(n);
                    for (i, &value) in series.values.iter().enumerate().take(n) {
                        let bottom = base[i];
                        let top = bottom + value;
                        base[i] = top;
                        bars.push(Rectangle::new(
                            [(i as f64 - 0.35, bottom), (i as f64 + 0.35, top)],
                            style,
                        ));
                    }
                    chart.draw_series(bars).map_err(chart_err)?;
                }
            }
            ChartKind::Line => {
                for (si, series) in spec.series.iter().enumerate() {
                    let color = PALETTE[si % PALETTE.len()];
                    chart
                        .draw_series(LineSeries::new(
                            series
                                .values
                                .iter()
                                .enumerate()
                                .take(n)
                                .map(|(i, &v)| (i as f64, v)),
                            color.stroke_width(2),
                        ))
                        .map_err(chart_err)?;
                }
            }
        }

        // Axis lines: x baseline at zero when zero is in range.
        let baseline = if y_min <= 0.0 && y_max >= 0.0 {
            0.0
        } else {
            y_min
        };
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x_min, baseline), (x_max, baseline)],
                BLACK.stroke_width(1),
            )))
            .map_err(chart_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x_min, y_min), (x_min, y_max)],
                BLACK.stroke_width(1),
            )))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    Ok(RenderedChart {
        width,
        height,
        pixels,
    })
}

/// The y range the plot needs to contain every drawn point, padded 5%.
fn value_range(spec: &ChartSpec) -> (f64, f64) {
    let mut min = 0.0f64;
    let mut max = 0.0f64;

    match spec.kind {
        ChartKind::StackedBar => {
            let n = spec.categories.len();
            for i in 0..n {
                let stack: f64 = spec
                    .series
                    .iter()
                    .filter_map(|s| s.values.get(i))
                    .sum();
                min = min.min(stack);
                max = max.max(stack);
            }
        }
        ChartKind::Line => {
            for series in &spec.series {
                for &value in &series.values {
                    min = min.min(value);
                    max = max.max(value);
                }
            }
        }
    }

    if (max - min).abs() < f64::EPSILON {
        max = min + 1.0;
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}
