use std::sync::Arc;

use dbx_demo_client::{FileDirectory, FileEntity};
use futures::{TryStreamExt as _, stream::BoxStream};

use crate::{RemoteQueryError, Reporter, reported};

/// Reports the contents of DBFS directories.
pub struct FileListingService<C: FileDirectory> {
    client: Arc<C>,
    reporter: Arc<dyn Reporter>,
}

impl<C: FileDirectory> FileListingService<C> {
    /// Creates a service listing files through `client`.
    #[must_use]
    pub const fn new(client: Arc<C>, reporter: Arc<dyn Reporter>) -> Self {
        Self { client, reporter }
    }

    /// Lazily lists the direct children of `path` in remote order.
    pub fn list_files(&self, path: &str) -> BoxStream<'_, Result<FileEntity, RemoteQueryError>> {
        log::debug!("Listing files in {path}");

        reported(
            self.client.list_files(path),
            self.reporter.clone(),
            "fs.list",
            format!("Error listing files in '{path}'"),
        )
    }

    /// Reports each path under `path` as soon as it arrives.
    ///
    /// # Errors
    ///
    /// * If the listing fails; paths already reported stay reported
    pub async fn report_file_paths(&self, path: &str) -> Result<(), RemoteQueryError> {
        let mut files = self.list_files(path);

        while let Some(file) = files.try_next().await? {
            self.reporter.report(&file.path);
        }

        Ok(())
    }
}
