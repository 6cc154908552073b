use polars::prelude::*;

use crate::columns::{AMOUNT_CATEGORY, DELIVERY_DAYS, LINE_TOTAL, ORDER_DATE, SHIPPED_DATE};
use crate::options::AmountBuckets;
use crate::values::{datetime_micros, float_values, MICROS_PER_DAY};

/// `DeliveryDays = ShippedDate - OrderDate` in whole days, floored. Negative
/// intervals are kept as-is.
pub fn apply_delivery_days(df: &DataFrame) -> Result<DataFrame, PolarsError> {
    let shipped = datetime_micros(df, SHIPPED_DATE)?;
    let ordered = datetime_micros(df, ORDER_DATE)?;

    let days: Vec<Option<i64>> = shipped
        .into_iter()
        .zip(ordered)
        .map(|pair| match pair {
            (Some(shipped), Some(ordered)) => Some((shipped - ordered).div_euclid(MICROS_PER_DAY)),
            _ => None,
        })
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(DELIVERY_DAYS.into(), days))?;
    Ok(output)
}

/// Buckets `LineTotal` into the configured ordinal labels. Values outside
/// every interval get `unbucketed_label`; null totals stay null.
pub fn apply_amount_category(
    df: &DataFrame,
    buckets: &AmountBuckets,
    unbucketed_label: &str,
) -> Result<DataFrame, PolarsError> {
    let totals = float_values(df, LINE_TOTAL)?;

    let labels: Vec<Option<&str>> = totals
        .iter()
        .map(|total| total.map(|value| buckets.classify(value).unwrap_or(unbucketed_label)))
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(AMOUNT_CATEGORY.into(), labels))?;
    Ok(output)
}
