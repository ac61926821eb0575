//! Error types for timeline import and export.

use thiserror::Error;

use crate::columns::ColumnRole;

/// Result type alias for timeline operations
pub type TimelineResult<T> = Result<T, TimelineError>;

/// Errors raised while parsing timecodes, resolving columns or assembling a timeline.
///
/// `MissingColumn` and `AmbiguousColumns` abort an import. `InvalidTimecode` and
/// `RowRejected` are row-level and end up in the import's rejected list.
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("invalid timecode: {raw:?}")]
    InvalidTimecode { raw: String },

    #[error("missing required column: {0}")]
    MissingColumn(ColumnRole),

    #[error("ambiguous {role} column, candidates: {}", .candidates.join(", "))]
    AmbiguousColumns {
        role: ColumnRole,
        candidates: Vec<String>,
    },

    #[error("row {row_index} rejected: end {end_seconds}s is before start {start_seconds}s")]
    RowRejected {
        row_index: usize,
        start_seconds: f64,
        end_seconds: f64,
    },

    #[error("CSV has no header row")]
    MissingHeader,

    #[error("frame rate must be a positive number, got {0}")]
    InvalidFrameRate(f64),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TimelineError {
    pub(crate) fn invalid_timecode(raw: &str) -> Self {
        TimelineError::InvalidTimecode {
            raw: raw.to_string(),
        }
    }

    /// True for errors that reject a single row rather than the whole import.
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            TimelineError::InvalidTimecode { .. } | TimelineError::RowRejected { .. }
        )
    }
}
