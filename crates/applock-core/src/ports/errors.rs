//! Errors surfaced by the persistence boundary.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lock store I/O failure: {0}")]
    Io(String),

    #[error("lock store record is corrupt: {0}")]
    Corrupt(String),
}
