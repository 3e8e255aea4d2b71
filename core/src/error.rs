use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    /// A required column is absent or holds a value of the wrong semantic type.
    #[error("Schema error at row {row}, column '{column}': {reason}")]
    Schema {
        row:    usize,
        column: String,
        reason: String,
    },

    /// A caller-supplied parameter is out of its domain.
    #[error("Invalid input: {reason}")]
    Input { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FeatureError {
    pub fn schema(row: usize, column: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            row,
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub fn input(reason: impl Into<String>) -> Self {
        Self::Input { reason: reason.into() }
    }
}

pub type FeatureResult<T> = Result<T, FeatureError>;
