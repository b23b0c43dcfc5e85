use thiserror::Error;

/// Main error type for fmexport
#[derive(Error, Debug)]
pub enum FmexportError {
    /// Snapshot store (SQLite) errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors talking to Last.fm
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Last.fm application-level errors (error envelope or bad status)
    #[error("Last.fm API error: {0}")]
    Api(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot store task errors (e.g. a cancelled blocking task)
    #[error("Store error: {0}")]
    Store(String),
}

/// Convenient Result type using FmexportError
pub type Result<T> = std::result::Result<T, FmexportError>;
