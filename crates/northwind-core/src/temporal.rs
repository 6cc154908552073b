use chrono::{DateTime, Datelike};
use polars::prelude::*;

use crate::columns::{DAY_OF_WEEK, MONTH, MONTH_NAME, ORDER_DATE, QUARTER, YEAR};
use crate::values::datetime_micros;

/// Attaches `Year`, `Month`, `Quarter`, `DayOfWeek` (0 = Monday) and
/// `MonthName` derived from `OrderDate`. Null dates yield null fields.
pub fn derive_calendar_fields(df: &DataFrame) -> Result<DataFrame, PolarsError> {
    let order_dates = datetime_micros(df, ORDER_DATE)?;
    let len = order_dates.len();

    let mut years: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut months: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut quarters: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut weekdays: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut month_names: Vec<Option<String>> = Vec::with_capacity(len);

    for micros in order_dates {
        match micros.and_then(DateTime::from_timestamp_micros) {
            Some(timestamp) => {
                let date = timestamp.naive_utc().date();
                let month = date.month() as i32;
                years.push(Some(date.year()));
                months.push(Some(month));
                quarters.push(Some((month - 1) / 3 + 1));
                weekdays.push(Some(date.weekday().num_days_from_monday() as i32));
                month_names.push(Some(date.format("%B").to_string()));
            }
            None => {
                years.push(None);
                months.push(None);
                quarters.push(None);
                weekdays.push(None);
                month_names.push(None);
            }
        }
    }

    let month_names: Vec<Option<&str>> = month_names.iter().map(|name| name.as_deref()).collect();

    let mut output = df.clone();
    output.with_column(Series::new(YEAR.into(), years))?;
    output.with_column(Series::new(MONTH.into(), months))?;
    output.with_column(Series::new(QUARTER.into(), quarters))?;
    output.with_column(Series::new(DAY_OF_WEEK.into(), weekdays))?;
    output.with_column(Series::new(MONTH_NAME.into(), month_names))?;

    Ok(output)
}
