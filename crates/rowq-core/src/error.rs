use thiserror::Error;

/// Canonical result for the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A line of input could not be decoded into a row. Fatal for the whole relation.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// An aggregator met a non-null value it could not coerce to a number.
    #[error("{aggregator}({column}): cannot coerce {value} to a number")]
    NumericCoercion {
        aggregator: String,
        column: String,
        value: String,
    },

    #[error("unsupported aggregator '{0}'")]
    UnsupportedAggregator(String),

    /// A row source was asked for its rows a second time.
    #[error("row source already consumed; materialize it if it must be read twice")]
    SourceConsumed,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("planning error: {0}")]
    Plan(String),

    #[error("hashing error: {0}")]
    Hash(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
