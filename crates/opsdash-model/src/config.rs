use std::fmt;

use serde::{Deserialize, Serialize};

const REDACTED: &str = "[REDACTED]";

/// Connection settings for Sage 100, read from the encrypted store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SageConfig {
    pub dsn: String,
    pub company_code: String,
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SageConfig")
            .field("dsn", &self.dsn)
            .field("company_code", &self.company_code)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

impl SageConfig {
    /// Names of the required settings that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("dsn", &self.dsn),
            ("company_code", &self.company_code),
            ("server", &self.server),
            ("database", &self.database),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Input for creating a new store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    pub sage: SageConfig,
    /// Default US sieve sizes for new sieve tests.
    pub sieve_defaults: Vec<i64>,
    /// Initial sample product names.
    pub samples: Vec<String>,
}
