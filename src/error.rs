use thiserror::Error;

/// Errors surfaced by the store and the state facade.
///
/// Duplicate or locked votes are not errors; `cast_vote` reports them as
/// `Ok(false)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid team tag: {0:?} (expected \"team_a\" or \"team_b\")")]
    InvalidTeam(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Short machine-readable code used in protocol error messages
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidTeam(_) => "INVALID_TEAM",
            StoreError::Sqlite(_) => "STORAGE_ERROR",
            StoreError::Task(_) => "STORAGE_ERROR",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
