use std::sync::Arc;

use arrow::array::{new_null_array, ArrayRef, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use crate::error::DashboardError;
use crate::standardize::StandardizedTable;

/// Column naming the company each row came from.
pub const COMPANY: &str = "Company";
pub const COMPANY_A: &str = "Company A";
pub const COMPANY_B: &str = "Company B";

/// A standardized table tagged with the company it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub batch: RecordBatch,
}

/// The row-wise union of two labeled tables. Rebuilt on every request,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    pub batch: RecordBatch,
}

impl CombinedTable {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Tag every row of a standardized table with a company label.
///
/// An uploaded passthrough column literally named `Company` would otherwise
/// shadow the label downstream; the label always wins, so any such column
/// is dropped before the label is appended.
pub fn label(table: StandardizedTable, company: &str) -> Result<LabeledTable, DashboardError> {
    let batch = table.batch;
    let num_rows = batch.num_rows();

    let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns() + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns() + 1);
    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        if field.name() != COMPANY {
            fields.push(field.as_ref().clone());
            columns.push(column.clone());
        }
    }

    fields.push(Field::new(COMPANY, DataType::Utf8, true));
    let labels = StringArray::from_iter_values(std::iter::repeat(company).take(num_rows));
    columns.push(Arc::new(labels) as ArrayRef);

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(LabeledTable { batch })
}

/// Concatenate two labeled tables, A's rows before B's.
///
/// The output schema is the union of both inputs: canonical columns first
/// (they are shared by construction), then A's passthrough columns in
/// order, then B-only passthroughs, with `Company` last. A passthrough cell
/// absent from one side is null — the explicit missing marker, distinct
/// from numeric 0 and from the null-date marker.
pub fn combine(a: LabeledTable, b: LabeledTable) -> Result<CombinedTable, DashboardError> {
    let schema = unioned_schema(&a.batch, &b.batch);
    let a = align_to_schema(&a.batch, &schema)?;
    let b = align_to_schema(&b.batch, &schema)?;
    let batch = concat_batches(&schema, [&a, &b])?;
    debug!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "combined tables"
    );
    Ok(CombinedTable { batch })
}

fn unioned_schema(a: &RecordBatch, b: &RecordBatch) -> SchemaRef {
    let mut fields: Vec<Field> = Vec::new();
    for field in a.schema().fields() {
        if field.name() != COMPANY {
            fields.push(field.as_ref().clone());
        }
    }
    for field in b.schema().fields() {
        if field.name() != COMPANY && !fields.iter().any(|f| f.name() == field.name()) {
            fields.push(field.as_ref().clone());
        }
    }
    fields.push(Field::new(COMPANY, DataType::Utf8, true));
    Arc::new(Schema::new(fields))
}

fn align_to_schema(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch, DashboardError> {
    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(column) => column.clone(),
            None => new_null_array(field.data_type(), batch.num_rows()),
        })
        .collect();
    RecordBatch::try_new(schema.clone(), columns).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RawTable;
    use crate::standardize::rules::{DATE, EXPENSES, REVENUE};
    use crate::standardize::standardize;
    use arrow::array::{Array, Float64Array};
    use arrow::compute;
    use pretty_assertions::assert_eq;

    fn standardized(headers: &[&str], rows: &[&[&str]]) -> StandardizedTable {
        standardize(&RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        })
        .unwrap()
    }

    fn company_values(table: &CombinedTable) -> Vec<String> {
        let companies = table
            .batch
            .column_by_name(COMPANY)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        (0..companies.len())
            .map(|i| companies.value(i).to_string())
            .collect()
    }

    fn sum(batch: &RecordBatch, name: &str) -> f64 {
        let column = batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        compute::sum(column).unwrap_or(0.0)
    }

    #[test]
    fn combine_keeps_all_rows_in_order() {
        let a = standardized(&["Sales"], &[&["1"], &["2"]]);
        let b = standardized(&["Sales"], &[&["3"], &["4"], &["5"]]);
        let combined = combine(
            label(a, COMPANY_A).unwrap(),
            label(b, COMPANY_B).unwrap(),
        )
        .unwrap();

        assert_eq!(combined.num_rows(), 5);
        assert_eq!(
            company_values(&combined),
            vec![COMPANY_A, COMPANY_A, COMPANY_B, COMPANY_B, COMPANY_B]
        );
    }

    #[test]
    fn totals_are_additive_across_the_merge() {
        let a = standardized(
            &["Revenue", "Cost"],
            &[&["100", "10"], &["200", "20"]],
        );
        let b = standardized(&["Revenue", "Cost"], &[&["50", "5"]]);
        let sum_a = sum(&a.batch, REVENUE);
        let sum_b = sum(&b.batch, REVENUE);
        let cost_a = sum(&a.batch, EXPENSES);
        let cost_b = sum(&b.batch, EXPENSES);

        let combined = combine(
            label(a, COMPANY_A).unwrap(),
            label(b, COMPANY_B).unwrap(),
        )
        .unwrap();

        assert_eq!(sum(&combined.batch, REVENUE), sum_a + sum_b);
        assert_eq!(sum(&combined.batch, EXPENSES), cost_a + cost_b);
    }

    #[test]
    fn differing_passthrough_columns_union_with_nulls() {
        let a = standardized(&["Revenue", "Region"], &[&["1", "North"]]);
        let b = standardized(&["Revenue", "Notes"], &[&["2", "audited"]]);
        let combined = combine(
            label(a, COMPANY_A).unwrap(),
            label(b, COMPANY_B).unwrap(),
        )
        .unwrap();

        let names: Vec<String> = combined
            .batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            vec![DATE, REVENUE, EXPENSES, "Region", "Notes", COMPANY]
        );

        let region = combined
            .batch
            .column_by_name("Region")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(region.value(0), "North");
        assert!(region.is_null(1));

        let notes = combined
            .batch
            .column_by_name("Notes")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(notes.is_null(0));
        assert_eq!(notes.value(1), "audited");
    }

    #[test]
    fn uploaded_company_column_is_overwritten_by_label() {
        // "Company" matches no recognition rule, so it survives
        // standardization as a passthrough; the label must still win.
        let a = standardized(&["Company", "Sales"], &[&["Acme Ltd", "1"]]);
        let b = standardized(&["Sales"], &[&["2"]]);
        let combined = combine(
            label(a, COMPANY_A).unwrap(),
            label(b, COMPANY_B).unwrap(),
        )
        .unwrap();

        assert_eq!(company_values(&combined), vec![COMPANY_A, COMPANY_B]);
        let company_fields = combined
            .batch
            .schema()
            .fields()
            .iter()
            .filter(|f| f.name() == COMPANY)
            .count();
        assert_eq!(company_fields, 1);
    }

    #[test]
    fn empty_inputs_combine_to_empty() {
        let a = standardized(&["Revenue"], &[]);
        let b = standardized(&["Cost"], &[]);
        let combined = combine(
            label(a, COMPANY_A).unwrap(),
            label(b, COMPANY_B).unwrap(),
        )
        .unwrap();
        assert_eq!(combined.num_rows(), 0);
        assert_eq!(combined.batch.num_columns(), 4);
    }
}
