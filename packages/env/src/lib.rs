//! Environment variable access for `dbx_demo`.
//!
//! Configuration is read through the [`EnvProvider`] trait so that the code
//! building client contexts never touches the process environment directly.
//! [`standard::StandardEnv`] reads the real process environment and
//! [`simulator::SimulatorEnv`] keeps an in-memory set of variables for tests.
//!
//! Settings may also come from an optional `.env` file, loaded once at
//! process start with [`load_env_file`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[cfg(feature = "simulator")]
pub mod simulator;
#[cfg(feature = "std")]
pub mod standard;

#[cfg(feature = "std")]
pub use standard::{StandardEnv, var_opt};

/// Errors that can occur when reading configuration values
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Environment variable '{0}' not found")]
    NotFound(String),
    #[error("Environment variable '{name}' is invalid: {message}")]
    Invalid { name: String, message: String },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

/// Result type for environment operations
pub type Result<T> = std::result::Result<T, EnvError>;

/// Source of configuration values keyed by environment variable name.
pub trait EnvProvider: Send + Sync {
    /// Get an environment variable as a string
    ///
    /// # Errors
    ///
    /// * If the environment variable is not found
    fn var(&self, name: &str) -> Result<String>;

    /// Get all environment variables
    fn vars(&self) -> BTreeMap<String, String>;

    /// Get an environment variable with a default value
    fn var_or(&self, name: &str, default: &str) -> String {
        self.var(name).unwrap_or_else(|_| default.to_string())
    }

    /// Get an environment variable, treating a missing or blank value as `None`
    fn var_opt(&self, name: &str) -> Option<String> {
        self.var(name).ok().filter(|value| !value.trim().is_empty())
    }

    /// Get a required environment variable, rejecting blank values
    ///
    /// # Errors
    ///
    /// * If the environment variable is missing or blank
    fn require(&self, name: &str) -> Result<String> {
        self.var_opt(name)
            .ok_or_else(|| EnvError::NotFound(name.to_string()))
    }
}

impl<T: EnvProvider + ?Sized> EnvProvider for &T {
    fn var(&self, name: &str) -> Result<String> {
        (**self).var(name)
    }

    fn vars(&self) -> BTreeMap<String, String> {
        (**self).vars()
    }
}

/// Loads `KEY=value` pairs from a settings file into the process environment.
///
/// Variables that are already set in the process environment win over the
/// file. A missing file is not an error and yields `Ok(None)`.
///
/// # Errors
///
/// * If the file exists but cannot be read or parsed
pub fn load_env_file(path: &Path) -> Result<Option<PathBuf>> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            log::debug!("Loaded settings from {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No settings file at {}", path.display());
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
