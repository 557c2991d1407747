use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database file not found: {path}")]
    Missing { path: PathBuf },

    #[error("database file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("failed to unlock {path}: wrong passphrase or not an encrypted database")]
    Auth { path: PathBuf },

    #[error("passphrase must not be empty")]
    EmptyPassphrase,

    #[error("passphrase variable {var} is not set")]
    PassphraseUnset { var: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid table name {name:?}")]
    InvalidTable { name: String },

    #[error("unknown scheduler job {id}")]
    UnknownJob { id: i64 },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
