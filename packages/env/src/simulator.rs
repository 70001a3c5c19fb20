//! In-memory environment for tests.
//!
//! Unlike the process environment, a [`SimulatorEnv`] starts out empty so
//! that tests only see the variables they set.

use crate::{EnvError, EnvProvider, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// In-memory environment provider for tests
#[derive(Clone, Default)]
pub struct SimulatorEnv {
    vars: Arc<RwLock<BTreeMap<String, String>>>,
}

impl SimulatorEnv {
    /// Creates an empty simulated environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a simulated environment holding `vars`
    #[must_use]
    pub fn from_vars<K: Into<String>, V: Into<String>>(
        vars: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            vars: Arc::new(RwLock::new(
                vars.into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            )),
        }
    }

    /// # Panics
    ///
    /// * If the internal `RwLock` is poisoned
    pub fn set_var(&self, name: &str, value: &str) {
        self.vars
            .write()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// # Panics
    ///
    /// * If the internal `RwLock` is poisoned
    pub fn remove_var(&self, name: &str) {
        self.vars.write().unwrap().remove(name);
    }
}

impl EnvProvider for SimulatorEnv {
    /// # Panics
    ///
    /// * If the internal `RwLock` is poisoned
    fn var(&self, name: &str) -> Result<String> {
        self.vars
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| EnvError::NotFound(name.to_string()))
    }

    /// # Panics
    ///
    /// * If the internal `RwLock` is poisoned
    fn vars(&self) -> BTreeMap<String, String> {
        self.vars.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test]
    fn set_and_remove_var() {
        let env = SimulatorEnv::new();
        env.set_var("ACCOUNT_HOST", "https://accounts.azuredatabricks.net");

        assert_eq!(
            env.var("ACCOUNT_HOST").unwrap(),
            "https://accounts.azuredatabricks.net"
        );

        env.remove_var("ACCOUNT_HOST");

        assert!(matches!(env.var("ACCOUNT_HOST"), Err(EnvError::NotFound(_))));
    }

    #[test_log::test]
    fn clones_share_the_same_variables() {
        let env = SimulatorEnv::from_vars([("ACCOUNT_ID", "abc")]);
        let other = env.clone();
        other.set_var("ACCOUNT_ID", "def");

        assert_eq!(env.var("ACCOUNT_ID").unwrap(), "def");
        assert_eq!(env.vars().len(), 1);
    }
}
