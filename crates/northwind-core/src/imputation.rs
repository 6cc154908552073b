use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::values::{is_integer, is_numeric, total_nulls};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    Median(f64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    pub fill: FillValue,
    pub filled: usize,
}

#[derive(Debug, Clone)]
pub struct ImputationResult {
    pub dataframe: DataFrame,
    pub nulls_before: usize,
    pub nulls_after: usize,
    pub imputed: Vec<ImputedColumn>,
}

/// Fills numeric nulls with the column median and text nulls with
/// `unknown_label`. Each median comes from the untouched input column.
/// Temporal and other column types are left as they are.
pub fn impute_missing(df: &DataFrame, unknown_label: &str) -> Result<ImputationResult, PolarsError> {
    let nulls_before = total_nulls(df);
    let mut output = df.clone();
    let mut imputed = Vec::new();

    for column in df.get_columns() {
        let missing = column.null_count();
        if missing == 0 {
            continue;
        }

        let name = column.name().clone();
        let dtype = column.dtype().clone();

        if is_numeric(&dtype) {
            let floats = column.cast(&DataType::Float64)?;
            let floats = floats.f64()?;
            let mut present: Vec<f64> = floats
                .into_iter()
                .flatten()
                .filter(|value| !value.is_nan())
                .collect();
            let Some(fill) = median(&mut present) else {
                debug!(column = %name, "no observed values to take a median from, leaving nulls");
                continue;
            };

            let filled: Vec<f64> = floats
                .into_iter()
                .map(|value| value.unwrap_or(fill))
                .collect();
            let mut series = Series::new(name.clone(), filled);
            if is_integer(&dtype) && fill.fract() == 0.0 {
                series = series.cast(&dtype)?;
            }
            output.with_column(series)?;

            debug!(column = %name, median = fill, filled = missing, "imputed numeric column");
            imputed.push(ImputedColumn {
                column: name.to_string(),
                fill: FillValue::Median(fill),
                filled: missing,
            });
        } else if matches!(dtype, DataType::String) {
            let filled: Vec<&str> = column
                .str()?
                .into_iter()
                .map(|value| value.unwrap_or(unknown_label))
                .collect();
            output.with_column(Series::new(name.clone(), filled))?;

            debug!(column = %name, filled = missing, "imputed categorical column");
            imputed.push(ImputedColumn {
                column: name.to_string(),
                fill: FillValue::Label(unknown_label.to_string()),
                filled: missing,
            });
        }
    }

    let nulls_after = total_nulls(&output);

    Ok(ImputationResult {
        dataframe: output,
        nulls_before,
        nulls_after,
        imputed,
    })
}

/// Median of `values`; sorts the slice in place.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
