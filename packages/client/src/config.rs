//! Settings for building the workspace and account client contexts.
//!
//! The workspace context is described by a named profile in the Databricks
//! configuration file (`~/.databrickscfg`). The account context is
//! described entirely by environment variables.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use dbx_demo_env::{EnvError, EnvProvider};
use thiserror::Error;

pub const WORKSPACE_PROFILE: &str = "WORKSPACE_PROFILE";
pub const ACCOUNT_HOST: &str = "ACCOUNT_HOST";
pub const ACCOUNT_ID: &str = "ACCOUNT_ID";
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const DATABRICKS_CONFIG_FILE: &str = "DATABRICKS_CONFIG_FILE";

static DEFAULT_CONFIG_FILE_NAME: &str = ".databrickscfg";

/// Errors that can occur while resolving client settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error("Could not locate the Databricks configuration file")]
    NoConfigFile,
    #[error("Failed to read {}: {source}", path.display())]
    ReadConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Profile '{profile}' not found in {}", path.display())]
    ProfileNotFound { profile: String, path: PathBuf },
    #[error("Profile '{0}' has no host")]
    MissingHost(String),
    #[error("Invalid host '{host}': {source}")]
    InvalidHost {
        host: String,
        source: url::ParseError,
    },
    #[error("Profile '{0}' has no usable credentials")]
    NoCredentials(String),
    #[error(transparent)]
    Client(#[from] crate::Error),
}

/// How a context authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    PersonalAccessToken {
        token: String,
    },
    AzureServicePrincipal {
        client_id: String,
        client_secret: String,
        tenant_id: Option<String>,
    },
    OAuthMachineToMachine {
        client_id: String,
        client_secret: String,
    },
}

impl Credentials {
    /// Short name of the authentication method, used in logs.
    #[must_use]
    pub const fn auth_type(&self) -> &'static str {
        match self {
            Self::PersonalAccessToken { .. } => "pat",
            Self::AzureServicePrincipal { .. } => "azure-client-secret",
            Self::OAuthMachineToMachine { .. } => "oauth-m2m",
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonalAccessToken { .. } => f
                .debug_struct("PersonalAccessToken")
                .finish_non_exhaustive(),
            Self::AzureServicePrincipal {
                client_id,
                tenant_id,
                ..
            } => f
                .debug_struct("AzureServicePrincipal")
                .field("client_id", client_id)
                .field("tenant_id", tenant_id)
                .finish_non_exhaustive(),
            Self::OAuthMachineToMachine { client_id, .. } => f
                .debug_struct("OAuthMachineToMachine")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Resolved settings of a workspace context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub profile: String,
    pub host: String,
    pub credentials: Credentials,
}

/// Resolved settings of an account context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    pub host: String,
    pub account_id: String,
    pub credentials: Credentials,
}

/// Adds `https://` to bare hostnames, strips trailing slashes and checks
/// that the result parses as a URL.
///
/// # Errors
///
/// * If the host is not a valid URL
pub fn normalize_host(host: &str) -> Result<String, ConfigError> {
    let host = host.trim();
    let host = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let host = host.trim_end_matches('/').to_string();

    url::Url::parse(&host).map_err(|source| ConfigError::InvalidHost {
        host: host.clone(),
        source,
    })?;

    Ok(host)
}

/// Parses the INI-style Databricks configuration file into sections of
/// key/value pairs. Lines starting with `#` or `;` are comments.
#[must_use]
pub fn parse_profiles(contents: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut profiles: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current = None;

    for line in contents.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(section) = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let section = section.trim().to_string();
            profiles.entry(section.clone()).or_default();
            current = Some(section);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::debug!("Ignoring malformed configuration line");
            continue;
        };

        if let Some(section) = &current {
            profiles
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    profiles
}

fn non_empty(section: &BTreeMap<String, String>, key: &str) -> Option<String> {
    section
        .get(key)
        .filter(|value| !value.is_empty())
        .cloned()
}

fn credentials_from_section(
    profile: &str,
    section: &BTreeMap<String, String>,
) -> Result<Credentials, ConfigError> {
    if let Some(token) = non_empty(section, "token") {
        return Ok(Credentials::PersonalAccessToken { token });
    }

    if let (Some(client_id), Some(client_secret)) = (
        non_empty(section, "azure_client_id"),
        non_empty(section, "azure_client_secret"),
    ) {
        return Ok(Credentials::AzureServicePrincipal {
            client_id,
            client_secret,
            tenant_id: non_empty(section, "azure_tenant_id"),
        });
    }

    if let (Some(client_id), Some(client_secret)) = (
        non_empty(section, "client_id"),
        non_empty(section, "client_secret"),
    ) {
        return Ok(Credentials::OAuthMachineToMachine {
            client_id,
            client_secret,
        });
    }

    Err(ConfigError::NoCredentials(profile.to_string()))
}

impl WorkspaceConfig {
    /// Resolves `WORKSPACE_PROFILE` against the Databricks configuration
    /// file (`DATABRICKS_CONFIG_FILE`, defaulting to `~/.databrickscfg`).
    ///
    /// # Errors
    ///
    /// * If `WORKSPACE_PROFILE` is not set
    /// * If the configuration file cannot be located or read
    /// * If the profile is missing or incomplete
    pub fn from_env(env: &impl EnvProvider) -> Result<Self, ConfigError> {
        let profile = env.require(WORKSPACE_PROFILE)?;
        let path = env
            .var_opt(DATABRICKS_CONFIG_FILE)
            .map(PathBuf::from)
            .or_else(|| home::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE_NAME)))
            .ok_or(ConfigError::NoConfigFile)?;

        Self::from_profile_file(&profile, &path)
    }

    /// Resolves `profile` from the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the profile is missing or incomplete
    pub fn from_profile_file(profile: &str, path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Reading profile '{profile}' from {}", path.display());

        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfigFile {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_profile_contents(profile, &contents, path)
    }

    /// Resolves `profile` from already loaded configuration file contents.
    ///
    /// # Errors
    ///
    /// * If the profile is missing or incomplete
    pub fn from_profile_contents(
        profile: &str,
        contents: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        let profiles = parse_profiles(contents);
        let section = profiles
            .get(profile)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                profile: profile.to_string(),
                path: path.to_path_buf(),
            })?;

        let host = non_empty(section, "host")
            .ok_or_else(|| ConfigError::MissingHost(profile.to_string()))?;

        Ok(Self {
            profile: profile.to_string(),
            host: normalize_host(&host)?,
            credentials: credentials_from_section(profile, section)?,
        })
    }
}

impl AccountConfig {
    /// Reads `ACCOUNT_HOST`, `ACCOUNT_ID`, `AZURE_CLIENT_ID`,
    /// `AZURE_CLIENT_SECRET` and the optional `AZURE_TENANT_ID`.
    ///
    /// # Errors
    ///
    /// * If a required variable is missing
    /// * If `ACCOUNT_HOST` is not a valid URL
    pub fn from_env(env: &impl EnvProvider) -> Result<Self, ConfigError> {
        Ok(Self {
            host: normalize_host(&env.require(ACCOUNT_HOST)?)?,
            account_id: env.require(ACCOUNT_ID)?,
            credentials: Credentials::AzureServicePrincipal {
                client_id: env.require(AZURE_CLIENT_ID)?,
                client_secret: env.require(AZURE_CLIENT_SECRET)?,
                tenant_id: env.var_opt(AZURE_TENANT_ID),
            },
        })
    }
}
