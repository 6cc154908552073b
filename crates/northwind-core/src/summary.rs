use serde::Serialize;

use crate::aggregation::Kpis;
use crate::coercion::CoercedColumn;
use crate::imputation::ImputedColumn;

/// Diagnostics of one transform run: what was coerced, derived, imputed,
/// produced and skipped. Never part of the data contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformSummary {
    pub input_rows: usize,
    pub input_columns: usize,
    pub output_columns: usize,
    pub coerced_date_columns: Vec<CoercedColumn>,
    pub derived_columns: Vec<String>,
    pub skipped_steps: Vec<SkippedStep>,
    pub nulls_before_imputation: usize,
    pub nulls_after_imputation: usize,
    pub imputed_columns: Vec<ImputedColumn>,
    pub aggregates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_period: Option<OrderPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpis: Option<Kpis>,
}

impl TransformSummary {
    pub fn unparseable_dates(&self) -> usize {
        self.coerced_date_columns
            .iter()
            .map(|column| column.unparseable)
            .sum()
    }

    pub fn was_skipped(&self, step: &str) -> bool {
        self.skipped_steps.iter().any(|skipped| skipped.step == step)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub step: String,
    pub missing_columns: Vec<String>,
}

impl SkippedStep {
    pub fn new(step: impl Into<String>, missing_columns: Vec<String>) -> Self {
        Self {
            step: step.into(),
            missing_columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPeriod {
    pub start: String,
    pub end: String,
}
