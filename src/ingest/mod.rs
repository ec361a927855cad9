use csv::ReaderBuilder;
use tracing::debug;

use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names from the header row. These are what the file claims;
    /// the standardizer decides what they mean.
    pub headers: Vec<String>,
    /// Each data row, as a Vec of Strings (one per field).
    pub rows: Vec<Vec<String>>,
}

/// Parse one uploaded file into a `RawTable`.
///
/// Field counts are strict: a row with more or fewer fields than the header
/// is a load failure, as is an input with no header at all. `label` names
/// the upload ("Company A" / "Company B") in the error shown to the user.
pub fn read_csv(label: &str, bytes: &[u8]) -> Result<RawTable, DashboardError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DashboardError::load_failure(label, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DashboardError::load_failure(label, "no column headers found"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DashboardError::load_failure(label, e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(label, columns = headers.len(), rows = rows.len(), "parsed upload");
    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_headers_and_rows() {
        let table = read_csv("Company A", b"Month,Sales\nJan,100\nFeb,200\n").unwrap();
        assert_eq!(table.headers, vec!["Month", "Sales"]);
        assert_eq!(
            table.rows,
            vec![vec!["Jan", "100"], vec!["Feb", "200"]]
        );
    }

    #[test]
    fn header_only_file_is_empty_table() {
        let table = read_csv("Company A", b"Date,Revenue\n").unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn empty_input_is_load_failure() {
        let err = read_csv("Company B", b"").unwrap_err();
        assert!(matches!(err, DashboardError::LoadFailure { .. }));
        assert!(err.to_string().contains("Company B"));
    }

    #[test]
    fn ragged_row_is_load_failure() {
        let err = read_csv("Company A", b"Date,Revenue\n2024-01-01,100,extra\n").unwrap_err();
        assert!(matches!(err, DashboardError::LoadFailure { .. }));
    }

    #[test]
    fn quoted_fields_survive() {
        let table = read_csv("Company A", b"Region,Amount\n\"North, West\",50\n").unwrap();
        assert_eq!(table.rows[0][0], "North, West");
    }
}
