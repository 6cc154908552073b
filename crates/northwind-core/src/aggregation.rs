use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::columns::*;
use crate::schema::{Capability, SchemaCapabilities};
use crate::summary::{SkippedStep, TransformSummary};
use crate::values::{float_values, is_integer, text_values};

/// The six aggregate views derived from the cleaned fact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    MonthlySales,
    CategorySales,
    TopProducts,
    CountrySales,
    EmployeeSales,
    Kpis,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 6] = [
        AggregateKind::MonthlySales,
        AggregateKind::CategorySales,
        AggregateKind::TopProducts,
        AggregateKind::CountrySales,
        AggregateKind::EmployeeSales,
        AggregateKind::Kpis,
    ];

    /// Views grouped along a single dimension; everything except the KPI row.
    pub const GROUPED: [AggregateKind; 5] = [
        AggregateKind::MonthlySales,
        AggregateKind::CategorySales,
        AggregateKind::TopProducts,
        AggregateKind::CountrySales,
        AggregateKind::EmployeeSales,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            AggregateKind::MonthlySales => "monthly_sales",
            AggregateKind::CategorySales => "category_sales",
            AggregateKind::TopProducts => "top_products",
            AggregateKind::CountrySales => "country_sales",
            AggregateKind::EmployeeSales => "employee_sales",
            AggregateKind::Kpis => "kpis",
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.table_name() == name)
    }

    /// Columns that must all exist for the view to be computed. `Quantity`
    /// and `CustomerID` are optional measures: their output columns appear
    /// only when the source column does. The KPI row has no hard
    /// requirement; it carries whichever measures exist.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            AggregateKind::MonthlySales => &[YEAR, MONTH, LINE_TOTAL, ORDER_ID],
            AggregateKind::CategorySales => &[CATEGORY_NAME, LINE_TOTAL, ORDER_ID],
            AggregateKind::TopProducts => &[PRODUCT_NAME, LINE_TOTAL, ORDER_ID],
            AggregateKind::CountrySales => &[CUSTOMER_COUNTRY, LINE_TOTAL, ORDER_ID],
            AggregateKind::EmployeeSales => &[EMPLOYEE_NAME, LINE_TOTAL, ORDER_ID],
            AggregateKind::Kpis => &[],
        }
    }
}

/// Global summary measures. `None` when the measure could not be computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: Option<f64>,
    pub total_orders: Option<usize>,
    pub total_customers: Option<usize>,
    pub total_products: Option<usize>,
    pub avg_order_value: Option<f64>,
    pub avg_delivery_days: Option<f64>,
}

#[derive(Default)]
struct GroupTotals {
    revenue: f64,
    quantity: f64,
    orders: HashSet<String>,
    customers: HashSet<String>,
}

/// Row-aligned measure columns shared by the grouped views. Quantity and
/// customer columns are optional measures loaded only when present.
struct Measures {
    revenue: Vec<Option<f64>>,
    orders: Vec<Option<String>>,
    quantity: Option<Vec<Option<f64>>>,
    customers: Option<Vec<Option<String>>>,
    integer_quantity: bool,
}

impl Measures {
    fn load(df: &DataFrame, caps: &SchemaCapabilities) -> PolarsResult<Self> {
        let (quantity, integer_quantity) = if caps.has(QUANTITY) {
            (
                Some(float_values(df, QUANTITY)?),
                is_integer(df.column(QUANTITY)?.dtype()),
            )
        } else {
            (None, false)
        };

        Ok(Self {
            revenue: float_values(df, LINE_TOTAL)?,
            orders: text_values(df, ORDER_ID)?,
            quantity,
            customers: if caps.has(CUSTOMER_ID) {
                Some(text_values(df, CUSTOMER_ID)?)
            } else {
                None
            },
            integer_quantity,
        })
    }
}

/// Accumulates measures per non-null key. Rows with a null key are dropped.
fn accumulate<K: Hash + Eq + Clone>(
    keys: &[Option<K>],
    measures: &Measures,
) -> HashMap<K, GroupTotals> {
    let mut groups: HashMap<K, GroupTotals> = HashMap::new();
    let mut dropped = 0usize;

    for (idx, key) in keys.iter().enumerate() {
        let Some(key) = key else {
            dropped += 1;
            continue;
        };
        let totals = groups.entry(key.clone()).or_default();

        if let Some(revenue) = measures.revenue[idx] {
            totals.revenue += revenue;
        }
        if let Some(order) = &measures.orders[idx] {
            totals.orders.insert(order.clone());
        }
        if let Some(Some(quantity)) = measures.quantity.as_ref().map(|values| values[idx]) {
            totals.quantity += quantity;
        }
        if let Some(Some(customer)) = measures.customers.as_ref().map(|values| &values[idx]) {
            totals.customers.insert(customer.clone());
        }
    }

    if dropped > 0 {
        debug!(dropped, "rows with a null grouping key were excluded");
    }

    groups
}

/// Descending by revenue; equal revenue falls back to ascending key.
fn rank(groups: HashMap<String, GroupTotals>) -> Vec<(String, GroupTotals)> {
    let mut rows: Vec<(String, GroupTotals)> = groups.into_iter().collect();
    rows.sort_by(|(key_a, a), (key_b, b)| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| key_a.cmp(key_b))
    });
    rows
}

/// Builds the measure columns of a grouped view in the given order.
fn measure_columns<K>(
    rows: &[(K, GroupTotals)],
    measures: &Measures,
    layout: &[Measure],
) -> Vec<Column> {
    let mut columns = Vec::with_capacity(layout.len());
    for measure in layout {
        let series = match measure {
            Measure::Revenue => Series::new(
                TOTAL_SALES.into(),
                rows.iter().map(|(_, t)| t.revenue).collect::<Vec<f64>>(),
            ),
            Measure::Orders => Series::new(
                NUM_ORDERS.into(),
                rows.iter().map(|(_, t)| count(&t.orders)).collect::<Vec<i64>>(),
            ),
            Measure::Quantity(name) => {
                if measures.quantity.is_none() {
                    continue;
                }
                let sums = rows.iter().map(|(_, t)| t.quantity);
                if measures.integer_quantity {
                    Series::new(
                        (*name).into(),
                        sums.map(|value| value.round() as i64).collect::<Vec<i64>>(),
                    )
                } else {
                    Series::new((*name).into(), sums.collect::<Vec<f64>>())
                }
            }
            Measure::Customers => {
                if measures.customers.is_none() {
                    continue;
                }
                Series::new(
                    NUM_CUSTOMERS.into(),
                    rows.iter().map(|(_, t)| count(&t.customers)).collect::<Vec<i64>>(),
                )
            }
        };
        columns.push(series.into());
    }
    columns
}

enum Measure {
    Revenue,
    Orders,
    Quantity(&'static str),
    Customers,
}

fn count(values: &HashSet<String>) -> i64 {
    values.len() as i64
}

fn ranked_view(
    df: &DataFrame,
    caps: &SchemaCapabilities,
    key_column: &str,
    output_key: &str,
    layout: &[Measure],
    limit: Option<usize>,
) -> Result<DataFrame, PolarsError> {
    let keys = text_values(df, key_column)?;
    let measures = Measures::load(df, caps)?;
    let mut rows = rank(accumulate(&keys, &measures));
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    let mut columns: Vec<Column> = vec![Series::new(
        output_key.into(),
        rows.iter().map(|(key, _)| key.as_str()).collect::<Vec<&str>>(),
    )
    .into()];
    columns.extend(measure_columns(&rows, &measures, layout));
    DataFrame::new(columns)
}

/// Revenue, distinct orders and quantity per (Year, Month), ascending by period.
///
/// Periods are grouped on the stored values. Integer keys are emitted as
/// `Int32`; when either key column is fractional (an imputed median such as
/// 2023.5) both are emitted as `Float64` and the period stays its own group.
pub fn monthly_sales(df: &DataFrame, caps: &SchemaCapabilities) -> Result<DataFrame, PolarsError> {
    let integral_keys =
        is_integer(df.column(YEAR)?.dtype()) && is_integer(df.column(MONTH)?.dtype());
    let years = float_values(df, YEAR)?;
    let months = float_values(df, MONTH)?;

    let keys: Vec<Option<(u64, u64)>> = years
        .iter()
        .zip(&months)
        .map(|pair| match pair {
            (Some(year), Some(month)) => Some((year.to_bits(), month.to_bits())),
            _ => None,
        })
        .collect();

    let measures = Measures::load(df, caps)?;
    let mut rows: Vec<((u64, u64), GroupTotals)> =
        accumulate(&keys, &measures).into_iter().collect();
    rows.sort_by(|((year_a, month_a), _), ((year_b, month_b), _)| {
        f64::from_bits(*year_a)
            .total_cmp(&f64::from_bits(*year_b))
            .then_with(|| f64::from_bits(*month_a).total_cmp(&f64::from_bits(*month_b)))
    });

    let period_years = rows.iter().map(|((year, _), _)| f64::from_bits(*year));
    let period_months = rows.iter().map(|((_, month), _)| f64::from_bits(*month));
    let mut columns: Vec<Column> = if integral_keys {
        vec![
            Series::new(YEAR.into(), period_years.map(|v| v as i32).collect::<Vec<i32>>()).into(),
            Series::new(MONTH.into(), period_months.map(|v| v as i32).collect::<Vec<i32>>()).into(),
        ]
    } else {
        let fractional = rows
            .iter()
            .filter(|((year, month), _)| {
                f64::from_bits(*year).fract() != 0.0 || f64::from_bits(*month).fract() != 0.0
            })
            .count();
        if fractional > 0 {
            warn!(fractional, "monthly_sales contains periods with non-integral keys");
        }
        vec![
            Series::new(YEAR.into(), period_years.collect::<Vec<f64>>()).into(),
            Series::new(MONTH.into(), period_months.collect::<Vec<f64>>()).into(),
        ]
    };
    columns.extend(measure_columns(
        &rows,
        &measures,
        &[Measure::Revenue, Measure::Orders, Measure::Quantity(TOTAL_QUANTITY)],
    ));
    DataFrame::new(columns)
}

/// Revenue, distinct orders and quantity per category, best sellers first.
pub fn category_sales(df: &DataFrame, caps: &SchemaCapabilities) -> Result<DataFrame, PolarsError> {
    ranked_view(
        df,
        caps,
        CATEGORY_NAME,
        CATEGORY,
        &[Measure::Revenue, Measure::Orders, Measure::Quantity(TOTAL_QUANTITY)],
        None,
    )
}

/// The `limit` products with the highest revenue.
pub fn top_products(
    df: &DataFrame,
    caps: &SchemaCapabilities,
    limit: usize,
) -> Result<DataFrame, PolarsError> {
    ranked_view(
        df,
        caps,
        PRODUCT_NAME,
        PRODUCT,
        &[Measure::Revenue, Measure::Quantity(QUANTITY), Measure::Orders],
        Some(limit),
    )
}

/// Revenue, distinct orders and distinct customers per customer country.
pub fn country_sales(df: &DataFrame, caps: &SchemaCapabilities) -> Result<DataFrame, PolarsError> {
    ranked_view(
        df,
        caps,
        CUSTOMER_COUNTRY,
        COUNTRY,
        &[Measure::Revenue, Measure::Orders, Measure::Customers],
        None,
    )
}

/// Revenue, distinct orders and distinct customers per employee.
pub fn employee_sales(df: &DataFrame, caps: &SchemaCapabilities) -> Result<DataFrame, PolarsError> {
    ranked_view(
        df,
        caps,
        EMPLOYEE_NAME,
        EMPLOYEE,
        &[Measure::Revenue, Measure::Orders, Measure::Customers],
        None,
    )
}

fn distinct(values: &[Option<String>]) -> usize {
    values.iter().flatten().collect::<HashSet<_>>().len()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), value| (sum + value, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Computes the KPI row from whichever source columns are present. Returns
/// `None` when not a single measure is computable.
pub fn kpi_summary(
    df: &DataFrame,
    caps: &SchemaCapabilities,
) -> Result<Option<(DataFrame, Kpis)>, PolarsError> {
    let mut kpis = Kpis::default();
    let mut columns: Vec<Column> = Vec::new();

    let revenue = if caps.has(LINE_TOTAL) {
        Some(float_values(df, LINE_TOTAL)?)
    } else {
        None
    };
    let orders = if caps.has(ORDER_ID) {
        Some(text_values(df, ORDER_ID)?)
    } else {
        None
    };

    if let Some(revenue) = &revenue {
        let total: f64 = revenue.iter().flatten().sum();
        kpis.total_revenue = Some(total);
        columns.push(Series::new(TOTAL_REVENUE.into(), &[total]).into());
    }

    if let Some(orders) = &orders {
        let total = distinct(orders);
        kpis.total_orders = Some(total);
        columns.push(Series::new(TOTAL_ORDERS.into(), &[total as i64]).into());
    }

    if caps.has(CUSTOMER_ID) {
        let total = distinct(&text_values(df, CUSTOMER_ID)?);
        kpis.total_customers = Some(total);
        columns.push(Series::new(TOTAL_CUSTOMERS.into(), &[total as i64]).into());
    }

    if caps.has(PRODUCT_ID) {
        let total = distinct(&text_values(df, PRODUCT_ID)?);
        kpis.total_products = Some(total);
        columns.push(Series::new(TOTAL_PRODUCTS.into(), &[total as i64]).into());
    }

    if let (Some(revenue), Some(orders)) = (&revenue, &orders) {
        // Line items collapse into one total per order before averaging.
        let mut per_order: BTreeMap<&str, f64> = BTreeMap::new();
        for (order, line_total) in orders.iter().zip(revenue) {
            let Some(order) = order else { continue };
            let entry = per_order.entry(order.as_str()).or_insert(0.0);
            if let Some(value) = line_total {
                *entry += value;
            }
        }
        let average = mean(per_order.into_values());
        kpis.avg_order_value = average;
        columns.push(Series::new(AVG_ORDER_VALUE.into(), &[average]).into());
    }

    if caps.has(DELIVERY_DAYS) {
        let days = float_values(df, DELIVERY_DAYS)?;
        let average = mean(days.into_iter().flatten());
        kpis.avg_delivery_days = average;
        columns.push(Series::new(AVG_DELIVERY_DAYS.into(), &[average]).into());
    }

    if columns.is_empty() {
        return Ok(None);
    }

    Ok(Some((DataFrame::new(columns)?, kpis)))
}

/// Computes every aggregate whose inputs exist, recording skipped ones.
pub fn aggregate_all(
    df: &DataFrame,
    caps: &SchemaCapabilities,
    top_products_limit: usize,
    summary: &mut TransformSummary,
) -> Result<BTreeMap<AggregateKind, DataFrame>, PolarsError> {
    let mut views = BTreeMap::new();

    for kind in AggregateKind::GROUPED {
        let missing = match caps.require(kind.required_columns()) {
            Capability::Available(_) => None,
            Capability::Unavailable { missing } => Some(missing),
        };
        if let Some(missing) = missing {
            warn!(aggregate = kind.table_name(), ?missing, "required columns missing, skipping");
            summary
                .skipped_steps
                .push(SkippedStep::new(kind.table_name(), missing));
            continue;
        }

        let frame = match kind {
            AggregateKind::MonthlySales => monthly_sales(df, caps)?,
            AggregateKind::CategorySales => category_sales(df, caps)?,
            AggregateKind::TopProducts => top_products(df, caps, top_products_limit)?,
            AggregateKind::CountrySales => country_sales(df, caps)?,
            AggregateKind::EmployeeSales => employee_sales(df, caps)?,
            AggregateKind::Kpis => continue,
        };
        if frame.height() == 0 {
            warn!(aggregate = kind.table_name(), "no grouping keys present, view is empty");
        }
        views.insert(kind, frame);
    }

    match kpi_summary(df, caps)? {
        Some((frame, kpis)) => {
            summary.kpis = Some(kpis);
            views.insert(AggregateKind::Kpis, frame);
        }
        None => {
            warn!(aggregate = "kpis", "no KPI inputs present, skipping");
            summary.skipped_steps.push(SkippedStep::new(
                AggregateKind::Kpis.table_name(),
                [LINE_TOTAL, ORDER_ID, CUSTOMER_ID, PRODUCT_ID, DELIVERY_DAYS]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ));
        }
    }

    summary
        .aggregates
        .extend(views.keys().map(|kind| kind.table_name().to_string()));
    info!(count = views.len(), "aggregate views created");

    Ok(views)
}
