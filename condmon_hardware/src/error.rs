use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("instrument closed")]
    Closed,
    #[error("invalid instrument setup: {0}")]
    Setup(String),
}
