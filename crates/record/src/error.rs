use thiserror::Error;

/// Errors raised by record accessors and the scalar types they coerce into.
///
/// `UndefinedValue` and `InvalidFormat` propagate to the immediate caller of
/// an accessor; callers wanting optional semantics use the nullable accessor
/// variants instead of catching these.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("name '{name}' does not exist in the record")]
    UndefinedValue { name: String },

    #[error("invalid format: {reason}")]
    InvalidFormat { reason: String },

    #[error("out of range: {reason}")]
    OutOfRange { reason: String },

    #[error("logic error: {reason}")]
    Logic { reason: String },
}

impl RecordError {
    pub fn undefined_value<S: ToString>(name: S) -> Self {
        Self::UndefinedValue { name: name.to_string() }
    }

    pub fn invalid_format<S: ToString>(reason: S) -> Self {
        Self::InvalidFormat { reason: reason.to_string() }
    }

    pub fn out_of_range<S: ToString>(reason: S) -> Self {
        Self::OutOfRange { reason: reason.to_string() }
    }

    pub fn logic<S: ToString>(reason: S) -> Self {
        Self::Logic { reason: reason.to_string() }
    }
}
