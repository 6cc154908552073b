use std::fs;

use anyhow::Result;
use polars::prelude::*;
use tempfile::tempdir;

use northwind_core::input::read_table;
use northwind_core::{
    transform, DirectorySink, InputError, OutputFormat, OutputSink, RawSalesSource,
    TransformOptions,
};

const BASIC_EXTRACT: &str = "\
OrderID,OrderDate,ShippedDate,CustomerID,CategoryName,ProductName,LineTotal,Quantity
10248,1996-07-04 00:00:00,1996-07-16 00:00:00,VINET,Dairy Products,Queso Cabrales,168.0,12
10248,1996-07-04 00:00:00,1996-07-16 00:00:00,VINET,Grains/Cereals,Singaporean Hokkien Fried Mee,98.0,10
10249,1996-07-05 00:00:00,1996-07-10 00:00:00,TOMSP,Produce,Tofu,167.4,9
";

#[test]
fn falls_back_to_the_basic_extract() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("sales_analysis.csv"), BASIC_EXTRACT)?;

    let extract = RawSalesSource::new(dir.path()).load()?;

    assert_eq!(extract.path, dir.path().join("sales_analysis.csv"));
    assert_eq!(extract.dataframe.height(), 3);
    assert_eq!(extract.dataframe.column("LineTotal")?.dtype(), &DataType::Float64);

    Ok(())
}

#[test]
fn complete_extract_wins_when_both_exist() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("sales_analysis.csv"), BASIC_EXTRACT)?;
    let first_line_only: String = BASIC_EXTRACT.lines().take(2).collect::<Vec<_>>().join("\n");
    fs::write(dir.path().join("sales_analysis_complete.csv"), first_line_only)?;

    let extract = RawSalesSource::new(dir.path()).load()?;

    assert_eq!(extract.path, dir.path().join("sales_analysis_complete.csv"));
    assert_eq!(extract.dataframe.height(), 1);

    Ok(())
}

#[test]
fn missing_extract_lists_every_candidate() -> Result<()> {
    let dir = tempdir()?;

    match RawSalesSource::new(dir.path()).load() {
        Err(InputError::NotFound { tried }) => {
            assert_eq!(tried.len(), 4);
            assert_eq!(tried[0], dir.path().join("sales_analysis_complete.csv"));
            assert_eq!(tried[3], dir.path().join("sales_analysis.parquet"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }

    Ok(())
}

#[test]
fn directory_sink_writes_every_table_as_csv() -> Result<()> {
    let raw_dir = tempdir()?;
    let out_dir = tempdir()?;
    fs::write(raw_dir.path().join("sales_analysis.csv"), BASIC_EXTRACT)?;

    let extract = RawSalesSource::new(raw_dir.path()).load()?;
    let output = transform(&extract.dataframe, &TransformOptions::default())?;

    let mut sink = DirectorySink::new(out_dir.path().join("processed"), OutputFormat::Csv)?;
    output.publish(&mut sink)?;

    assert_eq!(sink.written().len(), output.table_names().len());
    for name in output.table_names() {
        let path = sink.path_for(name);
        assert!(path.is_file(), "{} not written", path.display());
        let written = read_table(&path)?;
        let expected = output.table(name).expect("table exists");
        assert_eq!(written.height(), expected.height(), "{name} row count");
        assert_eq!(written.width(), expected.width(), "{name} column count");
    }

    // Staging files never survive a successful write.
    let leftovers = fs::read_dir(sink.dir())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);

    let top = read_table(&sink.path_for("top_products"))?;
    assert_eq!(top.column("Product")?.str()?.get(0), Some("Queso Cabrales"));

    Ok(())
}

#[test]
fn parquet_output_keeps_column_types() -> Result<()> {
    let out_dir = tempdir()?;
    let frame = df!(
        "Category" => &["Produce", "Beverages"],
        "TotalSales" => &[200.0f64, 120.0],
        "NumOrders" => &[1i64, 1],
    )?;

    let mut sink = DirectorySink::new(out_dir.path(), OutputFormat::Parquet)?;
    sink.write_table("category_sales", &frame)?;

    let path = out_dir.path().join("category_sales.parquet");
    let round = read_table(&path)?;
    assert!(round.equals_missing(&frame));
    assert_eq!(round.column("NumOrders")?.dtype(), &DataType::Int64);

    Ok(())
}

#[test]
fn failed_write_leaves_no_staging_file() -> Result<()> {
    let out_dir = tempdir()?;
    // A non-empty directory at the target path makes the final rename fail.
    let blocked = out_dir.path().join("kpis.csv");
    fs::create_dir(&blocked)?;
    fs::write(blocked.join("keep"), "occupied")?;

    let frame = df!("TotalRevenue" => &[320.0f64])?;
    let mut sink = DirectorySink::new(out_dir.path(), OutputFormat::Csv)?;

    assert!(sink.write_table("kpis", &frame).is_err());
    assert!(sink.written().is_empty());
    assert!(!out_dir.path().join(".kpis.csv.tmp").exists());

    Ok(())
}

#[test]
fn output_format_parses_case_insensitively() {
    assert_eq!("CSV".parse::<OutputFormat>().ok(), Some(OutputFormat::Csv));
    assert_eq!("parquet".parse::<OutputFormat>().ok(), Some(OutputFormat::Parquet));
    assert!("xlsx".parse::<OutputFormat>().is_err());
}
