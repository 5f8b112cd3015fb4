/// Database configuration and connection management
pub mod database;

/// Application settings loading from settings.toml
pub mod settings;

use crate::errors::Result;
use std::env::{self, VarError};

/// Reads an environment variable, treating an unset variable as `None`.
///
/// # Errors
/// Returns `EnvVar` if the variable is set but not valid unicode.
pub fn optional_env(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
