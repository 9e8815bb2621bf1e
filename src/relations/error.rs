use thiserror::Error;

/// Structural failures that abort an inference run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error("negative cycle detected through table '{table}'")]
    NegativeCycle { table: String },

    #[error("foreign key '{constraint}' has an empty {side} table name")]
    EmptyTableName {
        constraint: String,
        side: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, InferError>;
