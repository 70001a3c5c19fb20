#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Databricks directory client.
//!
//! Two client contexts are exposed: a [`WorkspaceClient`] bound to a single
//! workspace and an [`AccountClient`] bound to the account console. What a
//! context can list is expressed by the directory traits it implements, so
//! asking an account context for clusters does not compile.

use futures::stream::BoxStream;
use thiserror::Error;

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;
pub mod paging;

pub use config::{AccountConfig, ConfigError, Credentials, WorkspaceConfig};
pub use context::{AccountClient, DEFAULT_PAGE_SIZE, WorkspaceClient};
pub use models::{
    ClusterEntity, FileEntity, GroupEntity, QueryCriteria, SortOrder, UserAttribute, UserEntity,
};

use dbx_demo_env::EnvProvider;

/// Errors returned by the Databricks API calls.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Auth(#[from] auth::AuthError),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Request failed (error {status}): {message}")]
    RequestFailed { status: u16, message: String },
    #[error(transparent)]
    Deserialize(#[from] serde_json::Error),
}

/// Identity listing, available on both workspace and account contexts.
pub trait UserDirectory: Send + Sync {
    /// Lazily lists the users matching `criteria`. Pages are only requested
    /// as the stream is polled.
    fn list_users(&self, criteria: QueryCriteria) -> BoxStream<'_, Result<UserEntity, Error>>;

    /// Lazily lists every group in the context's scope.
    fn list_groups(&self) -> BoxStream<'_, Result<GroupEntity, Error>>;
}

/// Cluster listing, available on workspace contexts only.
pub trait ClusterDirectory: Send + Sync {
    /// Lazily lists every cluster, following page tokens.
    fn list_clusters(&self) -> BoxStream<'_, Result<ClusterEntity, Error>>;
}

/// DBFS listing, available on workspace contexts only.
pub trait FileDirectory: Send + Sync {
    /// Lists the direct children of a DBFS directory.
    fn list_files(&self, path: &str) -> BoxStream<'_, Result<FileEntity, Error>>;
}

/// Builds a workspace context from the profile named by `WORKSPACE_PROFILE`.
///
/// # Errors
///
/// * If the profile cannot be resolved to a host and credentials
/// * If the HTTP client cannot be built
pub fn workspace_client(env: &impl EnvProvider) -> Result<WorkspaceClient, ConfigError> {
    let config = WorkspaceConfig::from_env(env)?;

    log::debug!(
        "Using workspace profile '{}' at {} ({})",
        config.profile,
        config.host,
        config.credentials.auth_type()
    );

    Ok(WorkspaceClient::from_config(&config)?)
}

/// Builds an account context from the `ACCOUNT_*` and `AZURE_*` variables.
///
/// # Errors
///
/// * If a required variable is missing or invalid
/// * If the HTTP client cannot be built
pub fn account_client(env: &impl EnvProvider) -> Result<AccountClient, ConfigError> {
    let config = AccountConfig::from_env(env)?;

    log::debug!(
        "Using account {} at {} ({})",
        config.account_id,
        config.host,
        config.credentials.auth_type()
    );

    Ok(AccountClient::from_config(&config)?)
}
