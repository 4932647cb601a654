use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("malformed query: {message}")]
    InvalidShape { message: String },

    #[error("root query must declare a 'kind'")]
    MissingRootKind,

    #[error("invalid textPattern '{pattern}': {message}")]
    InvalidTextPattern { pattern: String, message: String },

    #[error("empty capture label")]
    EmptyCapture,

    #[error("unknown preset '{name}'")]
    UnknownPreset { name: String },

    #[error("I/O error reading query file: {0}")]
    Io(#[from] std::io::Error),
}
