use thiserror::Error;

/// Errors surfaced by the dashboard pipeline.
///
/// Per-cell parse failures are never errors; they degrade to defaults inside
/// the standardizer. The only user-visible failure is a whole upload that
/// cannot be read as tabular CSV.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// An upload could not be parsed as CSV. The message is shown verbatim
    /// on the dashboard page.
    #[error("could not load {label}: {detail}")]
    LoadFailure { label: String, detail: String },

    /// Arrow-level failure while assembling or concatenating tables.
    #[error("table error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A column the pipeline guarantees was not found. Indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    pub fn load_failure(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::LoadFailure {
            label: label.into(),
            detail: detail.into(),
        }
    }
}
