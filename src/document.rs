use crate::aggregate::AggregateResult;
use crate::chart::{render_chart, ChartSpec, ReportCharts};
use crate::error::{ReportError, Result};
use crate::utils::{format_currency, write_atomic};
use chrono::Local;
use log::info;
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use std::path::Path;

const TARGET: &str = "document";

// US letter, landscape.
const PAGE_WIDTH_MM: f32 = 279.4;
const PAGE_HEIGHT_MM: f32 = 215.9;

const CHART_WIDTH_PX: u32 = 1100;
const CHART_HEIGHT_PX: u32 = 620;
const CHART_DPI: f32 = 120.0;

fn pdf_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Export {
        target: TARGET,
        details: e.to_string(),
    }
}

/// Serialises the report into a paginated PDF, entirely in memory. Page
/// order: title, income chart, expense chart, P&L chart, inventory chart,
/// cash-flow chart, summary. Chart titles and axis labels are typeset with
/// the built-in Helvetica fonts around each embedded chart bitmap.
pub fn document_bytes(
    aggregates: &AggregateResult,
    charts: &ReportCharts,
) -> Result<Vec<u8>> {
    let (doc, title_page, title_layer) = PdfDocument::new(
        "Financial Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_err)?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let layer = doc.get_page(title_page).get_layer(title_layer);
    layer.use_text(
        "Financial Report",
        28.0,
        Mm(95.0),
        Mm(PAGE_HEIGHT_MM / 2.0 + 10.0),
        &font_bold,
    );
    layer.use_text(
        format!("Generated on: {}", Local::now().date_naive()),
        12.0,
        Mm(105.0),
        Mm(PAGE_HEIGHT_MM / 2.0 - 5.0),
        &font,
    );

    for spec in charts.all() {
        add_chart_page(&doc, spec, &font, &font_bold)?;
    }

    add_summary_page(&doc, aggregates, &font, &font_bold);

    let bytes = doc.save_to_bytes().map_err(pdf_err)?;
    info!("Built document report ({} bytes)", bytes.len());
    Ok(bytes)
}

/// Builds the PDF and writes it atomically: the target path only ever holds
/// a complete file.
pub fn write_document(
    aggregates: &AggregateResult,
    charts: &ReportCharts,
    path: &Path,
) -> Result<()> {
    let bytes = document_bytes(aggregates, charts)?;
    write_atomic(path, &bytes).map_err(|e| ReportError::Export {
        target: TARGET,
        details: e.to_string(),
    })
}

fn add_chart_page(
    doc: &PdfDocumentReference,
    spec: &ChartSpec,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
) -> Result<()> {
    let rendered = render_chart(spec, CHART_WIDTH_PX, CHART_HEIGHT_PX)?;
    let bitmap = RgbImage::from_raw(rendered.width, rendered.height, rendered.pixels)
        .ok_or_else(|| pdf_err("chart bitmap has unexpected size"))?;

    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    layer.use_text(
        spec.title.clone(),
        18.0,
        Mm(20.0),
        Mm(PAGE_HEIGHT_MM - 18.0),
        font_bold,
    );
    let legend = spec
        .series
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    layer.use_text(
        format!("{} by month. Series: {}", spec.y_label, legend),
        10.0,
        Mm(20.0),
        Mm(PAGE_HEIGHT_MM - 26.0),
        font,
    );
    layer.use_text(spec.x_label.clone(), 10.0, Mm(PAGE_WIDTH_MM / 2.0 - 6.0), Mm(12.0), font);

    let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(bitmap));
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(23.0)),
            translate_y: Some(Mm(28.0)),
            dpi: Some(CHART_DPI),
            ..Default::default()
        },
    );

    Ok(())
}

fn add_summary_page(
    doc: &PdfDocumentReference,
    aggregates: &AggregateResult,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
) {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let layer: PdfLayerReference = doc.get_page(page).get_layer(layer);

    layer.use_text(
        "Financial Summary",
        20.0,
        Mm(20.0),
        Mm(PAGE_HEIGHT_MM - 25.0),
        font_bold,
    );

    let metrics = [
        ("Total Income", aggregates.total_income),
        ("Total Expenses", aggregates.total_expenses),
        ("Net Profit", aggregates.net_profit()),
        ("Total Inventory Value", aggregates.total_inventory_value),
    ];
    for (i, (name, value)) in metrics.iter().enumerate() {
        let y = PAGE_HEIGHT_MM - 50.0 - (i as f32) * 14.0;
        layer.use_text(
            format!("{}: {}", name, format_currency(*value)),
            14.0,
            Mm(25.0),
            Mm(y),
            font,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::chart::build_charts;
    use crate::generator::sample_dataset;
    use crate::schema::Dataset;

    #[test]
    fn test_document_bytes_look_like_a_pdf() {
        let aggregates = aggregate(&sample_dataset());
        let charts = build_charts(&aggregates);
        let bytes = document_bytes(&aggregates, &charts).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_empty_aggregates_still_export() {
        let aggregates = aggregate(&Dataset::default());
        let charts = build_charts(&aggregates);
        let bytes = document_bytes(&aggregates, &charts).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_write_document_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let aggregates = aggregate(&sample_dataset());
        let charts = build_charts(&aggregates);

        write_document(&aggregates, &charts, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }
}
