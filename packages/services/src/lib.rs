#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Listing services built on top of the Databricks directory client.
//!
//! Every service reports remote failures once through its [`Reporter`] and
//! hands the failure back to the caller as a [`RemoteQueryError`].

use std::sync::Arc;

use futures::{StreamExt as _, TryStreamExt as _, stream::BoxStream};
use thiserror::Error;

pub mod clusters;
pub mod files;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use clusters::ClusterReportService;
pub use files::FileListingService;
pub use users::{UserQueryService, UserRecord};

/// A remote listing call failed. `source` is the client error unchanged.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct RemoteQueryError {
    pub operation: &'static str,
    pub source: dbx_demo_client::Error,
}

/// Sink for the lines a service emits and the failures it reports.
pub trait Reporter: Send + Sync {
    fn report(&self, line: &str);

    fn error(&self, message: &str);
}

/// Forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, line: &str) {
        log::info!("{line}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }
}

/// Wraps a client stream so the first failure is reported with `context`
/// and surfaces as a [`RemoteQueryError`].
fn reported<'a, T: Send + 'a>(
    stream: BoxStream<'a, Result<T, dbx_demo_client::Error>>,
    reporter: Arc<dyn Reporter>,
    operation: &'static str,
    context: String,
) -> BoxStream<'a, Result<T, RemoteQueryError>> {
    stream
        .map_err(move |source| {
            reporter.error(&format!("{context}: {source}"));
            RemoteQueryError { operation, source }
        })
        .boxed()
}
