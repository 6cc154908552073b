use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoercedColumn {
    pub column: String,
    /// Non-null source cells that could not be read as a date.
    pub unparseable: usize,
}

#[derive(Debug, Clone)]
pub struct CoercionResult {
    pub dataframe: DataFrame,
    pub coerced: Vec<CoercedColumn>,
}

/// Replaces every present candidate column with a `Datetime(µs)` column.
/// Cells that cannot be parsed become null; absent candidates are skipped.
pub fn coerce_date_columns(
    df: &DataFrame,
    candidates: &[String],
) -> Result<CoercionResult, PolarsError> {
    let mut output = df.clone();
    let mut coerced = Vec::new();

    for name in candidates {
        let Ok(column) = df.column(name) else {
            debug!(column = %name, "date column absent, skipping coercion");
            continue;
        };

        let (values, unparseable) = match column.dtype() {
            DataType::String => parse_text_column(column.str()?),
            DataType::Date | DataType::Datetime(_, _) => {
                let physical = column
                    .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
                    .cast(&DataType::Int64)?;
                (physical.i64()?.into_iter().collect(), 0)
            }
            DataType::Null => (vec![None; column.len()], 0),
            other => {
                warn!(column = %name, dtype = %other, "date column has a non-text type; treating every value as unparseable");
                (vec![None; column.len()], column.len() - column.null_count())
            }
        };

        if unparseable > 0 {
            warn!(column = %name, unparseable, "date values could not be parsed and were set to null");
        }

        let series = Series::new(name.as_str().into(), values)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
        output.with_column(series)?;

        coerced.push(CoercedColumn {
            column: name.clone(),
            unparseable,
        });
    }

    Ok(CoercionResult {
        dataframe: output,
        coerced,
    })
}

fn parse_text_column(values: &StringChunked) -> (Vec<Option<i64>>, usize) {
    let mut unparseable = 0;
    let parsed = values
        .into_iter()
        .map(|value| {
            let raw = value?;
            let micros = parse_datetime_micros(raw);
            if micros.is_none() && !raw.trim().is_empty() {
                unparseable += 1;
            }
            micros
        })
        .collect();
    (parsed, unparseable)
}

/// Parses a date or date-time string into UTC microseconds since the epoch.
pub fn parse_datetime_micros(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.timestamp_micros());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc().timestamp_micros());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc().timestamp_micros());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn micros(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .expect("valid date")
            .and_utc()
            .timestamp_micros()
    }

    #[test]
    fn accepts_common_layouts() {
        let midnight = micros(2024, 1, 5, 0, 0, 0);
        assert_eq!(parse_datetime_micros("2024-01-05"), Some(midnight));
        assert_eq!(parse_datetime_micros(" 2024-01-05 "), Some(midnight));
        assert_eq!(parse_datetime_micros("01/05/2024"), Some(midnight));
        assert_eq!(parse_datetime_micros("2024/01/05"), Some(midnight));
        assert_eq!(
            parse_datetime_micros("2024-01-05 13:45:10"),
            Some(micros(2024, 1, 5, 13, 45, 10))
        );
        assert_eq!(
            parse_datetime_micros("2024-01-05T13:45:10.500"),
            Some(micros(2024, 1, 5, 13, 45, 10) + 500_000)
        );
        assert_eq!(
            parse_datetime_micros("2024-01-05T13:45:10+02:00"),
            Some(micros(2024, 1, 5, 11, 45, 10))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_datetime_micros(""), None);
        assert_eq!(parse_datetime_micros("not a date"), None);
        assert_eq!(parse_datetime_micros("2024-13-45"), None);
    }
}
