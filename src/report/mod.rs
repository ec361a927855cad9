use arrow::array::{Array, Date32Array, Float64Array, StringArray};
use arrow::compute;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::merge::{CombinedTable, COMPANY};
use crate::standardize::date_parser;
use crate::standardize::rules::{DATE, EXPENSES, REVENUE};

/// The metrics the dashboard can plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Revenue,
    Expenses,
}

impl Metric {
    pub fn column(self) -> &'static str {
        match self {
            Metric::Revenue => REVENUE,
            Metric::Expenses => EXPENSES,
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Revenue
    }
}

/// Overall totals across both companies.
#[derive(Debug, Serialize, PartialEq)]
pub struct Totals {
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
}

/// Descriptive statistics for one numeric column. Quartiles use linear
/// interpolation; std is the sample standard deviation and is null for
/// fewer than two rows. Every statistic is null for an empty column, so
/// the page shows blanks instead of fabricated zeros.
#[derive(Debug, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// One bar-chart trace per company, points in axis order.
#[derive(Debug, Serialize, PartialEq)]
pub struct Series {
    pub company: String,
    pub x: Vec<Option<String>>,
    pub y: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct ChartData {
    /// "Date" when any row has a real date, otherwise "Period".
    pub axis: String,
    pub title: String,
    pub series: Vec<Series>,
}

/// Everything the dashboard page needs to render one upload pair.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub totals: Totals,
    pub metrics: Vec<&'static str>,
    pub metric: Metric,
    pub chart: ChartData,
    pub summary: Vec<ColumnSummary>,
    pub rows: usize,
}

pub fn dashboard(table: &CombinedTable, metric: Metric) -> Result<DashboardView, DashboardError> {
    Ok(DashboardView {
        totals: totals(table)?,
        metrics: vec![REVENUE, EXPENSES],
        metric,
        chart: chart(table, metric)?,
        summary: describe(table)?,
        rows: table.num_rows(),
    })
}

pub fn totals(table: &CombinedTable) -> Result<Totals, DashboardError> {
    let revenue = compute::sum(float_column(&table.batch, REVENUE)?).unwrap_or(0.0);
    let expenses = compute::sum(float_column(&table.batch, EXPENSES)?).unwrap_or(0.0);
    Ok(Totals {
        revenue,
        expenses,
        profit: revenue - expenses,
    })
}

pub fn describe(table: &CombinedTable) -> Result<Vec<ColumnSummary>, DashboardError> {
    [REVENUE, EXPENSES]
        .iter()
        .map(|name| summarize(&table.batch, name))
        .collect()
}

/// Chart series for one metric, grouped by company.
///
/// If any row carries a real date, rows are sorted ascending by date (null
/// dates last, original order otherwise preserved) and the axis is `Date`.
/// Otherwise the axis is a synthesized 0-based `Period` index. Null-date
/// rows on the Date axis get a null x value.
pub fn chart(table: &CombinedTable, metric: Metric) -> Result<ChartData, DashboardError> {
    let batch = &table.batch;
    let dates = date_column(batch)?;
    let values = float_column(batch, metric.column())?;
    let companies = string_column(batch, COMPANY)?;

    let num_rows = batch.num_rows();
    let has_dates = num_rows > 0 && dates.null_count() < num_rows;

    let mut order: Vec<usize> = (0..num_rows).collect();
    if has_dates {
        order.sort_by_key(|&row| {
            if dates.is_null(row) {
                (1u8, 0i32)
            } else {
                (0u8, dates.value(row))
            }
        });
    }

    let mut series: Vec<Series> = Vec::new();
    for (position, &row) in order.iter().enumerate() {
        let company = if companies.is_null(row) {
            String::new()
        } else {
            companies.value(row).to_string()
        };
        let index = match series.iter().position(|s| s.company == company) {
            Some(index) => index,
            None => {
                series.push(Series {
                    company,
                    x: Vec::new(),
                    y: Vec::new(),
                });
                series.len() - 1
            }
        };
        let x = if has_dates {
            if dates.is_null(row) {
                None
            } else {
                Some(date_parser::from_epoch_days(dates.value(row)).to_string())
            }
        } else {
            Some(position.to_string())
        };
        series[index].x.push(x);
        series[index].y.push(values.value(row));
    }

    Ok(ChartData {
        axis: if has_dates { DATE } else { "Period" }.to_string(),
        title: format!("{} Over Time", metric.column()),
        series,
    })
}

fn summarize(batch: &RecordBatch, name: &str) -> Result<ColumnSummary, DashboardError> {
    let column = float_column(batch, name)?;
    let mut values: Vec<f64> = column.iter().flatten().collect();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    if count == 0 {
        return Ok(ColumnSummary {
            column: name.to_string(),
            count,
            mean: None,
            std: None,
            min: None,
            q25: None,
            median: None,
            q75: None,
            max: None,
        });
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let squared: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((squared / (count - 1) as f64).sqrt())
    } else {
        None
    };

    Ok(ColumnSummary {
        column: name.to_string(),
        count,
        mean: Some(mean),
        std,
        min: Some(values[0]),
        q25: Some(quantile(&values, 0.25)),
        median: Some(quantile(&values, 0.5)),
        q75: Some(quantile(&values, 0.75)),
        max: Some(values[count - 1]),
    })
}

/// Linear-interpolation quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (position - lower as f64) * (sorted[upper] - sorted[lower])
    }
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array, DashboardError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| DashboardError::Internal(format!("missing numeric column {name}")))
}

fn date_column(batch: &RecordBatch) -> Result<&Date32Array, DashboardError> {
    batch
        .column_by_name(DATE)
        .and_then(|c| c.as_any().downcast_ref::<Date32Array>())
        .ok_or_else(|| DashboardError::Internal(format!("missing date column {DATE}")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, DashboardError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| DashboardError::Internal(format!("missing text column {name}")))
}
