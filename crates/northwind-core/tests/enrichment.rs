use polars::prelude::*;

use northwind_core::coercion::coerce_date_columns;
use northwind_core::derived::{apply_amount_category, apply_delivery_days};
use northwind_core::temporal::derive_calendar_fields;
use northwind_core::{AmountBuckets, TransformOptions};

fn coerced(df: DataFrame) -> DataFrame {
    coerce_date_columns(&df, &TransformOptions::default().date_column_candidates)
        .expect("coercion")
        .dataframe
}

#[test]
fn calendar_fields_follow_order_date() -> PolarsResult<()> {
    // 2024-01-05 is a Friday, 2023-12-31 a Sunday.
    let df = coerced(df!(
        "OrderDate" => &[Some("2024-01-05 10:30:00"), Some("2023-12-31"), None],
    )?);

    let enriched = derive_calendar_fields(&df)?;

    let year = enriched.column("Year")?.i32()?;
    let month = enriched.column("Month")?.i32()?;
    let quarter = enriched.column("Quarter")?.i32()?;
    let weekday = enriched.column("DayOfWeek")?.i32()?;
    let month_name = enriched.column("MonthName")?.str()?;

    assert_eq!(year.get(0), Some(2024));
    assert_eq!(month.get(0), Some(1));
    assert_eq!(quarter.get(0), Some(1));
    assert_eq!(weekday.get(0), Some(4));
    assert_eq!(month_name.get(0), Some("January"));

    assert_eq!(year.get(1), Some(2023));
    assert_eq!(quarter.get(1), Some(4));
    assert_eq!(weekday.get(1), Some(6));
    assert_eq!(month_name.get(1), Some("December"));

    // Null dates propagate; nothing is imputed at this stage.
    assert_eq!(year.get(2), None);
    assert_eq!(month_name.get(2), None);

    Ok(())
}

#[test]
fn delivery_days_are_signed_whole_days() -> PolarsResult<()> {
    let df = coerced(df!(
        "OrderDate" => &[Some("2024-01-05"), Some("2024-01-10"), Some("2024-01-05"), None],
        "ShippedDate" => &[Some("2024-01-08"), Some("2024-01-07"), None, Some("2024-01-01")],
    )?);

    let enriched = apply_delivery_days(&df)?;
    let days = enriched.column("DeliveryDays")?.i64()?;

    assert_eq!(days.get(0), Some(3));
    assert_eq!(days.get(1), Some(-3));
    assert_eq!(days.get(2), None);
    assert_eq!(days.get(3), None);

    Ok(())
}

#[test]
fn partial_days_floor_like_timedelta_days() -> PolarsResult<()> {
    let df = coerced(df!(
        "OrderDate" => &["2024-01-05 18:00:00", "2024-01-05 18:00:00"],
        "ShippedDate" => &["2024-01-06 06:00:00", "2024-01-05 06:00:00"],
    )?);

    let enriched = apply_delivery_days(&df)?;
    let days = enriched.column("DeliveryDays")?.i64()?;

    assert_eq!(days.get(0), Some(0));
    assert_eq!(days.get(1), Some(-1));

    Ok(())
}

#[test]
fn amount_category_marks_out_of_range_totals() -> PolarsResult<()> {
    let df = df!(
        "LineTotal" => &[Some(50.0f64), Some(100.0), Some(250.0), Some(999.0), Some(5000.0), Some(0.0), Some(-20.0), None],
    )?;

    let enriched = apply_amount_category(&df, &AmountBuckets::default(), "Unbucketed")?;
    let labels: Vec<Option<&str>> = enriched
        .column("AmountCategory")?
        .str()?
        .into_iter()
        .collect();

    assert_eq!(
        labels,
        vec![
            Some("Small"),
            Some("Small"),
            Some("Medium"),
            Some("Large"),
            Some("Very Large"),
            Some("Unbucketed"),
            Some("Unbucketed"),
            None,
        ]
    );

    Ok(())
}
