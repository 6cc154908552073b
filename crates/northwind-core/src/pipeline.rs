use std::collections::BTreeMap;

use chrono::DateTime;
use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::aggregation::{self, AggregateKind};
use crate::coercion;
use crate::columns::{
    AMOUNT_CATEGORY, DELIVERY_DAYS, LINE_TOTAL, ORDER_DATE, SHIPPED_DATE, TEMPORAL_COLUMNS,
};
use crate::derived;
use crate::error::{Result, TransformError};
use crate::imputation;
use crate::options::TransformOptions;
use crate::schema::{Capability, SchemaCapabilities};
use crate::sink::{OutputSink, SinkError};
use crate::summary::{OrderPeriod, SkippedStep, TransformSummary};
use crate::temporal;
use crate::values::datetime_micros;

pub const SALES_CLEAN: &str = "sales_clean";

/// Cleaned fact table plus every aggregate view that could be computed.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub sales_clean: DataFrame,
    pub aggregates: BTreeMap<AggregateKind, DataFrame>,
    pub summary: TransformSummary,
}

impl TransformOutput {
    pub fn aggregate(&self, kind: AggregateKind) -> Option<&DataFrame> {
        self.aggregates.get(&kind)
    }

    /// Looks a table up by its downstream name, `sales_clean` included.
    pub fn table(&self, name: &str) -> Option<&DataFrame> {
        if name == SALES_CLEAN {
            return Some(&self.sales_clean);
        }
        AggregateKind::from_table_name(name).and_then(|kind| self.aggregate(kind))
    }

    pub fn table_names(&self) -> Vec<&'static str> {
        std::iter::once(SALES_CLEAN)
            .chain(self.aggregates.keys().map(|kind| kind.table_name()))
            .collect()
    }

    /// Hands the fact table and then each aggregate, in canonical order, to `sink`.
    pub fn publish(&self, sink: &mut dyn OutputSink) -> std::result::Result<(), SinkError> {
        sink.write_table(SALES_CLEAN, &self.sales_clean)?;
        for (kind, frame) in &self.aggregates {
            sink.write_table(kind.table_name(), frame)?;
        }
        Ok(())
    }
}

/// Runs coercion, enrichment, imputation and aggregation over the raw
/// sales extract. Steps whose input columns are absent are skipped and
/// reported in the summary; only an unusable input aborts the run.
pub fn transform(raw: &DataFrame, options: &TransformOptions) -> Result<TransformOutput> {
    options.validate()?;

    if raw.width() == 0 {
        return Err(TransformError::MissingInput(
            "raw sales extract has no columns".to_string(),
        ));
    }
    if raw.height() == 0 {
        return Err(TransformError::MissingInput(
            "raw sales extract has no rows".to_string(),
        ));
    }

    let mut summary = TransformSummary {
        input_rows: raw.height(),
        input_columns: raw.width(),
        ..TransformSummary::default()
    };
    let mut caps = SchemaCapabilities::probe(raw);

    info!(rows = raw.height(), columns = raw.width(), "cleaning sales data");

    let coerced = coercion::coerce_date_columns(raw, &options.date_column_candidates)?;
    let mut df = coerced.dataframe;
    summary.coerced_date_columns = coerced.coerced;

    match caps.require(&[ORDER_DATE]) {
        Capability::Available(_) => {
            df = temporal::derive_calendar_fields(&df)?;
            for column in TEMPORAL_COLUMNS {
                caps.record(column);
                summary.derived_columns.push(column.to_string());
            }
        }
        Capability::Unavailable { missing } => skip(&mut summary, "temporal_enrichment", missing),
    }

    match caps.require(&[SHIPPED_DATE, ORDER_DATE]) {
        Capability::Available(_) => {
            df = derived::apply_delivery_days(&df)?;
            caps.record(DELIVERY_DAYS);
            summary.derived_columns.push(DELIVERY_DAYS.to_string());
        }
        Capability::Unavailable { missing } => skip(&mut summary, "delivery_days", missing),
    }

    match caps.require(&[LINE_TOTAL]) {
        Capability::Available(_) => {
            df = derived::apply_amount_category(
                &df,
                &options.amount_buckets,
                &options.unbucketed_label,
            )?;
            caps.record(AMOUNT_CATEGORY);
            summary.derived_columns.push(AMOUNT_CATEGORY.to_string());
        }
        Capability::Unavailable { missing } => skip(&mut summary, "amount_category", missing),
    }

    let imputed = imputation::impute_missing(&df, &options.unknown_label)?;
    let sales_clean = imputed.dataframe;
    summary.nulls_before_imputation = imputed.nulls_before;
    summary.nulls_after_imputation = imputed.nulls_after;
    summary.imputed_columns = imputed.imputed;
    summary.output_columns = sales_clean.width();
    info!(
        before = imputed.nulls_before,
        after = imputed.nulls_after,
        "missing values imputed"
    );

    if caps.has(ORDER_DATE) {
        summary.order_period = order_period(&sales_clean)?;
    }

    let aggregates = aggregation::aggregate_all(
        &sales_clean,
        &caps,
        options.top_products_limit,
        &mut summary,
    )?;

    Ok(TransformOutput {
        sales_clean,
        aggregates,
        summary,
    })
}

fn skip(summary: &mut TransformSummary, step: &str, missing: Vec<String>) {
    warn!(step, ?missing, "input columns absent, step skipped");
    summary.skipped_steps.push(SkippedStep::new(step, missing));
}

fn order_period(df: &DataFrame) -> Result<Option<OrderPeriod>> {
    let dates = datetime_micros(df, ORDER_DATE)?;
    let present = dates.iter().flatten();
    let (Some(start), Some(end)) = (present.clone().min(), present.max()) else {
        return Ok(None);
    };

    let render = |micros: i64| {
        DateTime::from_timestamp_micros(micros)
            .map(|timestamp| timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    };

    Ok(Some(OrderPeriod {
        start: render(*start),
        end: render(*end),
    }))
}
