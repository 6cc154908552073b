use std::path::PathBuf;

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use northwind_core::imputation::FillValue;
use northwind_core::{Kpis, TransformOutput};

/// Human-readable run summary printed after a transform.
pub fn render(output: &TransformOutput, written: &[PathBuf]) -> String {
    let summary = &output.summary;
    let mut sections: Vec<String> = Vec::new();

    let mut overview = table(&["Cleaned data", ""]);
    overview.add_row(vec!["Rows".to_string(), summary.input_rows.to_string()]);
    overview.add_row(vec![
        "Columns".to_string(),
        format!("{} -> {}", summary.input_columns, summary.output_columns),
    ]);
    if let Some(period) = &summary.order_period {
        overview.add_row(vec![
            "Period".to_string(),
            format!("{} to {}", period.start, period.end),
        ]);
    }
    overview.add_row(vec![
        "Missing values".to_string(),
        format!(
            "{} -> {}",
            summary.nulls_before_imputation, summary.nulls_after_imputation
        ),
    ]);
    overview.add_row(vec![
        "Unparseable dates".to_string(),
        summary.unparseable_dates().to_string(),
    ]);
    sections.push(overview.to_string());

    if !summary.skipped_steps.is_empty() {
        let mut skipped = table(&["Skipped step", "Missing columns"]);
        for step in &summary.skipped_steps {
            skipped.add_row(vec![step.step.clone(), step.missing_columns.join(", ")]);
        }
        sections.push(skipped.to_string());
    }

    if !summary.imputed_columns.is_empty() {
        let mut imputed = table(&["Imputed column", "Fill value", "Cells"]);
        for column in &summary.imputed_columns {
            let fill = match &column.fill {
                FillValue::Median(value) => format!("median {value}"),
                FillValue::Label(label) => format!("'{label}'"),
            };
            imputed.add_row(vec![column.column.clone(), fill, column.filled.to_string()]);
        }
        sections.push(imputed.to_string());
    }

    if let Some(kpis) = &summary.kpis {
        sections.push(kpi_table(kpis).to_string());
    }

    let mut files = table(&["Table", "Rows", "File"]);
    for name in output.table_names() {
        let rows = output.table(name).map(|df| df.height()).unwrap_or_default();
        let path = written
            .iter()
            .find(|path| path.file_stem().is_some_and(|stem| stem == name))
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        files.add_row(vec![name.to_string(), rows.to_string(), path]);
    }
    sections.push(files.to_string());

    sections.join("\n")
}

fn kpi_table(kpis: &Kpis) -> Table {
    let mut kpi_rows = table(&["KPI", "Value"]);
    let mut push = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            kpi_rows.add_row(vec![label.to_string(), value]);
        }
    };
    push("Total revenue", kpis.total_revenue.map(|v| format!("${v:.2}")));
    push("Orders", kpis.total_orders.map(|v| v.to_string()));
    push("Customers", kpis.total_customers.map(|v| v.to_string()));
    push("Products", kpis.total_products.map(|v| v.to_string()));
    push("Average order value", kpis.avg_order_value.map(|v| format!("${v:.2}")));
    push(
        "Average delivery days",
        kpis.avg_delivery_days.map(|v| format!("{v:.1}")),
    );
    kpi_rows
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}
