use thiserror::Error;

/// Failure of a single cursor probe. Always local to the current line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("delimiter `{delimiter}` not found")]
    MissingDelimiter { delimiter: String },
    #[error("`{text}` is not a valid integer")]
    InvalidInteger { text: String },
    #[error("`{text}` is not a valid float")]
    InvalidFloat { text: String },
}

/// Errors reported while recognizing the `[time] pid.tid>` line prefix.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("malformed serial log line: missing `[`")]
    MissingOpenBracket,
    #[error("malformed serial log line: bad {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: ScanError,
    },
}

impl EnvelopeError {
    pub(crate) fn field(field: &'static str) -> impl FnOnce(ScanError) -> Self {
        move |source| Self::Field { field, source }
    }
}
