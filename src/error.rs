use std::fmt;

/// Failure kinds surfaced by the dataset codec, the trainer's cross-checks,
/// and the checkpoint codec. Every failure is returned to the caller; nothing
/// is retried or silently dropped.
#[derive(Debug, Clone)]
pub enum Error {
    /// Unreadable or malformed dataset bytes.
    Decode(String),
    /// Item-matrix column count and label-vector length disagree.
    DimensionMismatch { items: usize, labels: usize },
    /// Missing or corrupt checkpoint file, or a shape mismatch on load.
    Checkpoint(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decode(msg) => write!(f, "dataset decode error: {msg}"),
            Error::DimensionMismatch { items, labels } => {
                write!(f, "labels do not match data: {items} examples vs {labels} labels")
            }
            Error::Checkpoint(msg) => write!(f, "checkpoint error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
