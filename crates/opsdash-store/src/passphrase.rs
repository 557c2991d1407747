//! Scoped handle for the database master passphrase.

use std::fmt;

use crate::error::StoreError;

/// Environment variable the passphrase is read from by default.
pub const DEFAULT_PASSPHRASE_VAR: &str = "DB_MASTER_PASSWORD";

/// The master passphrase of the encrypted store.
///
/// The value is only readable inside this crate, never appears in `Debug`
/// output, and its buffer is zeroed when the handle is dropped. Pass it by
/// reference to whatever opens a store connection.
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Result<Self, StoreError> {
        let value = value.into();
        if value.is_empty() {
            return Err(StoreError::EmptyPassphrase);
        }
        Ok(Self(value))
    }

    /// Reads the passphrase from an environment variable.
    pub fn from_env(var: &str) -> Result<Self, StoreError> {
        match std::env::var(var) {
            Ok(value) => Self::new(value),
            Err(_) => Err(StoreError::PassphraseUnset {
                var: var.to_string(),
            }),
        }
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase([REDACTED])")
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.iter_mut().for_each(|byte| *byte = 0);
        std::hint::black_box(&bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            Passphrase::new(""),
            Err(StoreError::EmptyPassphrase)
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let passphrase = Passphrase::new("correct horse").unwrap();
        assert_eq!(format!("{passphrase:?}"), "Passphrase([REDACTED])");
        assert_eq!(passphrase.expose(), "correct horse");
    }

    #[test]
    fn unset_variable() {
        let err = Passphrase::from_env("OPSDASH_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, StoreError::PassphraseUnset { .. }));
    }
}
