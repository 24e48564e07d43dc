use strided_view::{ElementFormat, StridedError};

/// Errors raised by the binding, dispatch and option layers.
///
/// Every precondition error is raised before the first native call, so an
/// `Err` other than [`LinalgError::NativeRoutine`] means no operand buffer was
/// touched.
#[derive(Debug, thiserror::Error)]
pub enum LinalgError {
    #[error("invalid value for {family} option: {value}")]
    InvalidOption { family: &'static str, value: String },

    #[error("type error: {0}")]
    Type(String),

    /// Loader diagnostic text, verbatim.
    #[error("{0}")]
    LibraryLoad(String),

    /// Loader diagnostic text, verbatim.
    #[error("{message}")]
    SymbolResolution { symbol: String, message: String },

    #[error("{family} library is not loaded")]
    LibraryNotLoaded { family: &'static str },

    #[error("{family} prefix is not set")]
    PrefixNotSet { family: &'static str },

    #[error("routine {symbol} is not available")]
    RoutineUnavailable { symbol: String },

    #[error("{routine} has no {format} variant")]
    UnsupportedFormat {
        routine: &'static str,
        format: ElementFormat,
    },

    #[error("{operand}: rank {rank}, expected {expected}")]
    Dimension {
        operand: &'static str,
        rank: usize,
        expected: &'static str,
    },

    #[error("{operand}: {reason}")]
    Shape {
        operand: &'static str,
        reason: String,
    },

    #[error("{symbol} returned info = {info}")]
    NativeRoutine { symbol: String, info: i32 },

    #[error(transparent)]
    Strided(StridedError),
}

impl From<StridedError> for LinalgError {
    fn from(err: StridedError) -> Self {
        match err {
            StridedError::LossyCast { .. } => LinalgError::Type(err.to_string()),
            other => LinalgError::Strided(other),
        }
    }
}

/// Convenience alias for `Result<T, LinalgError>`.
pub type Result<T> = std::result::Result<T, LinalgError>;
