use thiserror::Error;

/// Every failure the variogram engine can report.
///
/// Validation variants are user-correctable and end up as the `error_message`
/// of a [`crate::variography::dataset::VariogramDataset`]; the remaining
/// variants come from integration faults or I/O.
#[derive(Debug, Error)]
pub enum VariogramError {
    #[error(
        "bin count must be between 1 and {}, got {0}",
        crate::variography::experimental::MAX_BIN_COUNT
    )]
    InvalidBinCount(u32),

    #[error("max distance must be a positive number, got {0}")]
    InvalidMaxDistance(f64),

    #[error("invalid expressions or ROIs selected")]
    EmptySelection,

    #[error("point id mismatch at index {index}: {left} != {right}")]
    MismatchedPointIds { index: usize, left: i64, right: i64 },

    #[error("{what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to fetch data: {0}")]
    Fetch(String),

    #[error("degenerate axis range [{min}, {max}]")]
    DegenerateAxis { min: f64, max: f64 },

    #[error("viewport {width}x{height} leaves no room for the plot area")]
    DegenerateViewport { width: f64, height: f64 },

    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("failed to parse `{value}` in column `{column}`")]
    Parse { column: String, value: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl VariogramError {
    /// Validation failures the user can fix by changing the selection or parameters.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            VariogramError::InvalidBinCount(_)
                | VariogramError::InvalidMaxDistance(_)
                | VariogramError::EmptySelection
        )
    }
}
