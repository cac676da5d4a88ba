use qazlaw_core::UnknownCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    /// A stored enum column holds a value the current vocabulary does not know.
    #[error("corrupt row: {0}")]
    UnknownCode(#[from] UnknownCode),
}
