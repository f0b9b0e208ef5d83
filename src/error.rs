use crate::store::StoreError;

/// Errors returned to the caller of a seed or workload invocation.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("argument {name}: expected a non-negative integer, got '{value}'")]
    ArgumentFormat { name: &'static str, value: String },

    #[error("incorrect number of arguments: got {actual}, required {expected}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("unable to accept negative delay: {0}ms")]
    NegativeDelay(i64),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("failed to persist record count: {0}")]
    SeedPersist(#[source] StoreError),

    #[error("unable to upsert key '{key}': {source}")]
    WriteFailure { key: String, source: StoreError },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// True for caller mistakes detected before any store access.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::ArgumentFormat { .. }
                | Self::ArgumentCount { .. }
                | Self::NegativeDelay(_)
                | Self::UnknownFunction(_)
        )
    }

    /// True when the backing store rejected a write the call depended on.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::SeedPersist(_) | Self::WriteFailure { .. })
    }
}
