//! Command-line entry point for `dbx_demo`.
//!
//! Lists Databricks identities and workspace resources through a
//! workspace-scoped and an account-scoped client.
//!
//! # Usage
//!
//! ```text
//! dbx_demo [--env-file <PATH>] [--fail-on-error] [COMMAND]
//! ```
//!
//! Without a command the full demo runs: workspace users, account users,
//! cluster names and the files under `/FileStore/`.
//!
//! Remote failures are logged as critical and the process still exits
//! successfully unless `--fail-on-error` is given. Configuration errors
//! always exit with a failure status.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand, ValueEnum};
use dbx_demo_client::{
    ClusterDirectory, ConfigError, FileDirectory, UserDirectory, account_client, workspace_client,
};
use dbx_demo_env::{EnvProvider, StandardEnv};
use dbx_demo_services::{
    ClusterReportService, FileListingService, LogReporter, RemoteQueryError, Reporter,
    UserQueryService, UserRecord,
};

static DEFAULT_USER_FILTER: &str = "userName co gc";
static DEFAULT_FILE_PATH: &str = "/FileStore/";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Settings file to load. Variables already present in the
    /// environment are not overridden.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Exit with a failure status when a remote call fails.
    #[arg(long, global = true)]
    fail_on_error: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Workspace users, account users, clusters and files in one run.
    Demo {
        #[arg(long, default_value = DEFAULT_USER_FILTER)]
        workspace_filter: String,

        #[arg(long, default_value = DEFAULT_USER_FILTER)]
        account_filter: String,

        /// DBFS directory to list.
        #[arg(long, default_value = DEFAULT_FILE_PATH)]
        path: String,
    },
    /// Users matching a SCIM filter, e.g. "userName co gc".
    Users {
        #[arg(long, value_enum, default_value = "workspace")]
        scope: Scope,

        filter: String,
    },
    /// Group display names.
    Groups {
        #[arg(long, value_enum, default_value = "account")]
        scope: Scope,
    },
    /// Cluster names in the workspace.
    Clusters,
    /// Paths directly under a DBFS directory.
    Files {
        #[arg(default_value = DEFAULT_FILE_PATH)]
        path: String,
    },
}

impl Default for Command {
    fn default() -> Self {
        Self::Demo {
            workspace_filter: DEFAULT_USER_FILTER.to_string(),
            account_filter: DEFAULT_USER_FILTER.to_string(),
            path: DEFAULT_FILE_PATH.to_string(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Workspace,
    Account,
}

/// How a run ended once configuration succeeded.
#[derive(Debug)]
enum Outcome {
    Completed,
    RemoteFailure(RemoteQueryError),
}

impl Outcome {
    const fn exit_status(&self, fail_on_error: bool) -> u8 {
        match self {
            Self::RemoteFailure(_) if fail_on_error => 1,
            Self::Completed | Self::RemoteFailure(_) => 0,
        }
    }
}

fn render_users(users: &[UserRecord]) -> String {
    serde_json::to_string(users).unwrap_or_else(|_| format!("{users:?}"))
}

async fn report_users<C: UserDirectory>(
    label: &str,
    client: Arc<C>,
    filter: &str,
    reporter: &Arc<dyn Reporter>,
) -> Result<(), RemoteQueryError> {
    let users = UserQueryService::new(client, reporter.clone())
        .get_filtered_users(filter)
        .await?;

    reporter.report(&format!("{label} users: {}", render_users(&users)));

    Ok(())
}

async fn report_groups<C: UserDirectory>(
    label: &str,
    client: Arc<C>,
    reporter: &Arc<dyn Reporter>,
) -> Result<(), RemoteQueryError> {
    let groups = UserQueryService::new(client, reporter.clone())
        .list_groups()
        .await?;

    reporter.report(&format!("{label} groups: {groups:?}"));

    Ok(())
}

/// Stops at the first failure. Lines reported before it stay reported.
async fn demo<W, A>(
    workspace: Arc<W>,
    account: Arc<A>,
    workspace_filter: &str,
    account_filter: &str,
    path: &str,
    reporter: &Arc<dyn Reporter>,
) -> Result<(), RemoteQueryError>
where
    W: UserDirectory + ClusterDirectory + FileDirectory,
    A: UserDirectory,
{
    report_users("Workspace", workspace.clone(), workspace_filter, reporter).await?;
    report_users("Account", account, account_filter, reporter).await?;

    ClusterReportService::new(workspace.clone(), reporter.clone())
        .report_cluster_names()
        .await?;

    FileListingService::new(workspace, reporter.clone())
        .report_file_paths(path)
        .await
}

/// Builds the contexts `command` needs, then runs it. Only configuration
/// problems are returned as errors; remote failures end up in the
/// [`Outcome`].
async fn run(
    env: &impl EnvProvider,
    command: Command,
    reporter: &Arc<dyn Reporter>,
) -> Result<Outcome, ConfigError> {
    let result = match command {
        Command::Demo {
            workspace_filter,
            account_filter,
            path,
        } => {
            let workspace = Arc::new(workspace_client(env)?);
            let account = Arc::new(account_client(env)?);

            demo(
                workspace,
                account,
                &workspace_filter,
                &account_filter,
                &path,
                reporter,
            )
            .await
        }
        Command::Users {
            scope: Scope::Workspace,
            filter,
        } => report_users("Workspace", Arc::new(workspace_client(env)?), &filter, reporter).await,
        Command::Users {
            scope: Scope::Account,
            filter,
        } => report_users("Account", Arc::new(account_client(env)?), &filter, reporter).await,
        Command::Groups {
            scope: Scope::Workspace,
        } => report_groups("Workspace", Arc::new(workspace_client(env)?), reporter).await,
        Command::Groups {
            scope: Scope::Account,
        } => report_groups("Account", Arc::new(account_client(env)?), reporter).await,
        Command::Clusters => {
            ClusterReportService::new(Arc::new(workspace_client(env)?), reporter.clone())
                .report_cluster_names()
                .await
        }
        Command::Files { path } => {
            FileListingService::new(Arc::new(workspace_client(env)?), reporter.clone())
                .report_file_paths(&path)
                .await
        }
    };

    Ok(result.map_or_else(Outcome::RemoteFailure, |()| Outcome::Completed))
}

/// # Panics
///
/// * If the logging system fails to initialize
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let env_file = dbx_demo_env::load_env_file(&args.env_file);

    let _guard = dbx_demo_logging::init(Some("dbx_demo.log"), None)
        .expect("Failed to initialize logging");

    match env_file {
        Ok(Some(path)) => log::debug!("Loaded settings from {}", path.display()),
        Ok(None) => log::debug!("No settings file at {}", args.env_file.display()),
        Err(e) => {
            log::error!("Failed to load {}: {e}", args.env_file.display());
            return ExitCode::FAILURE;
        }
    }

    let command = args.command.unwrap_or_default();

    log::debug!("Running {command:?}");

    let reporter: Arc<dyn Reporter> = Arc::new(LogReporter);

    match run(&StandardEnv::new(), command, &reporter).await {
        Ok(outcome) => {
            if let Outcome::RemoteFailure(e) = &outcome {
                dbx_demo_logging::critical!("Error: {e}");
            }
            ExitCode::from(outcome.exit_status(args.fail_on_error))
        }
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            ExitCode::FAILURE
        }
    }
}
