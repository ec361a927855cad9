use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Builder, Float64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use crate::error::DashboardError;
use crate::ingest::RawTable;

pub mod date_parser;
pub mod rules;

use rules::{DATE, EXPENSES, REVENUE};

/// A table with the canonical `Date`/`Revenue`/`Expenses` columns guaranteed
/// present and typed. Columns matching no recognition rule are passed
/// through as nullable text under their trimmed original names, after the
/// canonical three.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedTable {
    pub batch: RecordBatch,
}

impl StandardizedTable {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Numeric coercion for Revenue/Expenses cells. Strips outer whitespace and
/// quotes, a leading `$`, and thousands-separator commas, so "1,200" and
/// "$1200" both coerce. Anything that still fails to parse is `None`, which
/// the standardizer turns into 0.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = clean_str(raw);
    let cleaned = cleaned.strip_prefix('$').unwrap_or(&cleaned);
    cleaned.replace(',', "").trim().parse::<f64>().ok()
}

/// Normalize one raw table into a `StandardizedTable`.
///
/// Headers are classified by `rules::canonical_for`. When several source
/// columns map to the same output name the last matching column wins: its
/// values are used, the output column keeps the position where the name
/// first appeared, and the earlier duplicates are dropped.
///
/// No cell-level failure is an error. Unparseable dates become null,
/// unparseable numbers become 0, and absent canonical columns are created
/// with those same defaults, so the dashboard always has something to show.
pub fn standardize(raw: &RawTable) -> Result<StandardizedTable, DashboardError> {
    // Output name -> source column index, in first-appearance order.
    let mut mapping: Vec<(String, usize)> = Vec::with_capacity(raw.headers.len());
    for (idx, header) in raw.headers.iter().enumerate() {
        let target = match rules::canonical_for(header) {
            Some(name) => name.to_string(),
            None => header.trim().to_string(),
        };
        match mapping.iter_mut().find(|(name, _)| *name == target) {
            Some(entry) => entry.1 = idx,
            None => mapping.push((target, idx)),
        }
    }

    let source_of = |name: &str| -> Option<usize> {
        mapping
            .iter()
            .find(|(target, _)| target == name)
            .map(|(_, idx)| *idx)
    };
    // Rows shorter than the header read as empty cells.
    let cell = |row: &[String], idx: usize| -> String {
        row.get(idx).cloned().unwrap_or_default()
    };

    let num_rows = raw.rows.len();
    let mut fields: Vec<Field> = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    let mut dates = Date32Builder::with_capacity(num_rows);
    match source_of(DATE) {
        Some(idx) => {
            for row in &raw.rows {
                let parsed = date_parser::parse_date(&cell(row, idx));
                dates.append_option(parsed.map(date_parser::to_epoch_days));
            }
        }
        None => {
            for _ in 0..num_rows {
                dates.append_null();
            }
        }
    }
    fields.push(Field::new(DATE, DataType::Date32, true));
    columns.push(Arc::new(dates.finish()) as ArrayRef);

    for name in [REVENUE, EXPENSES] {
        let mut values = Float64Builder::with_capacity(num_rows);
        match source_of(name) {
            Some(idx) => {
                for row in &raw.rows {
                    values.append_value(parse_number(&cell(row, idx)).unwrap_or(0.0));
                }
            }
            None => {
                for _ in 0..num_rows {
                    values.append_value(0.0);
                }
            }
        }
        fields.push(Field::new(name, DataType::Float64, true));
        columns.push(Arc::new(values.finish()) as ArrayRef);
    }

    for (target, idx) in &mapping {
        if target == DATE || target == REVENUE || target == EXPENSES {
            continue;
        }
        let mut values = StringBuilder::new();
        for row in &raw.rows {
            values.append_value(cell(row, *idx));
        }
        fields.push(Field::new(target.as_str(), DataType::Utf8, true));
        columns.push(Arc::new(values.finish()) as ArrayRef);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema, columns)?;
    debug!(
        rows = num_rows,
        columns = batch.num_columns(),
        "standardized table"
    );
    Ok(StandardizedTable { batch })
}
