use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The driver could not open a connection.
    #[error("failed to connect to DSN {dsn}: {message}")]
    Connect { dsn: String, message: String },

    /// A query against an open connection failed.
    #[error("query failed: {message}")]
    Fetch { message: String },
}

impl SourceError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }
}
