use crate::{EnvError, EnvProvider, Result};
use std::collections::BTreeMap;

/// Environment provider backed by `std::env`
pub struct StandardEnv;

impl StandardEnv {
    /// Creates a new standard environment provider
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for StandardEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvProvider for StandardEnv {
    fn var(&self, name: &str) -> Result<String> {
        std::env::var(name).map_err(|e| match e {
            std::env::VarError::NotPresent => EnvError::NotFound(name.to_string()),
            std::env::VarError::NotUnicode(_) => EnvError::Invalid {
                name: name.to_string(),
                message: "value is not valid unicode".to_string(),
            },
        })
    }

    fn vars(&self) -> BTreeMap<String, String> {
        std::env::vars().collect()
    }
}

static PROVIDER: StandardEnv = StandardEnv::new();

/// Get a process environment variable, treating blank values as unset
#[must_use]
pub fn var_opt(name: &str) -> Option<String> {
    PROVIDER.var_opt(name)
}
