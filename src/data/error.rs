/// Failures at the ingestion boundary.
///
/// Only the roster and shot log can fail a run: without player, team and
/// game identity no rows can be built. Context tables degrade instead (see
/// `loader::load_context`).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {table} table: {source}")]
    Csv {
        table: &'static str,
        source: csv::Error,
    },

    #[error("{table} table is missing required column `{column}`")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl IngestError {
    /// True when the input's shape, not its transport, is at fault.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, IngestError::MissingColumn { .. })
    }
}
