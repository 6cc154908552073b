use polars::prelude::*;

pub(crate) const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

pub(crate) fn datetime_micros(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let physical = df
        .column(name)?
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(physical.i64()?.into_iter().collect())
}

pub(crate) fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let floats = df.column(name)?.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

/// Cell values rendered as text, used for grouping keys and distinct counts.
pub(crate) fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let text = df.column(name)?.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

pub(crate) fn is_integer(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64
    )
}

pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    is_integer(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

pub(crate) fn total_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|column| column.null_count()).sum()
}
