use std::sync::Arc;

use dbx_demo_client::{ClusterDirectory, ClusterEntity};
use futures::{TryStreamExt as _, stream::BoxStream};

use crate::{RemoteQueryError, Reporter, reported};

/// Reports the clusters of a workspace.
pub struct ClusterReportService<C: ClusterDirectory> {
    client: Arc<C>,
    reporter: Arc<dyn Reporter>,
}

impl<C: ClusterDirectory> ClusterReportService<C> {
    /// Creates a service listing clusters through `client`.
    #[must_use]
    pub const fn new(client: Arc<C>, reporter: Arc<dyn Reporter>) -> Self {
        Self { client, reporter }
    }

    /// Lazily lists every cluster in remote order.
    pub fn list_clusters(&self) -> BoxStream<'_, Result<ClusterEntity, RemoteQueryError>> {
        log::debug!("Listing clusters");

        reported(
            self.client.list_clusters(),
            self.reporter.clone(),
            "clusters.list",
            "Error listing clusters".to_string(),
        )
    }

    /// Reports each cluster name as soon as it arrives.
    ///
    /// # Errors
    ///
    /// * If any page fails; names already reported stay reported
    pub async fn report_cluster_names(&self) -> Result<(), RemoteQueryError> {
        let mut clusters = self.list_clusters();

        while let Some(cluster) = clusters.try_next().await? {
            self.reporter.report(&cluster.cluster_name);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{FakeDirectory, RecordingReporter, cluster, failure};

    #[test_log::test(tokio::test)]
    async fn reports_one_line_per_cluster_in_order() {
        let reporter = Arc::new(RecordingReporter::default());
        let service = ClusterReportService::new(
            Arc::new(FakeDirectory {
                clusters: vec![Ok(cluster("etl")), Ok(cluster("adhoc"))],
                ..FakeDirectory::default()
            }),
            reporter.clone(),
        );

        service.report_cluster_names().await.unwrap();

        assert_eq!(reporter.lines(), vec!["etl", "adhoc"]);
    }

    #[test_log::test(tokio::test)]
    async fn no_clusters_reports_nothing() {
        let reporter = Arc::new(RecordingReporter::default());
        let service =
            ClusterReportService::new(Arc::new(FakeDirectory::default()), reporter.clone());

        service.report_cluster_names().await.unwrap();

        assert!(reporter.lines().is_empty());
        assert!(reporter.errors().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn names_before_a_failure_are_still_reported() {
        let reporter = Arc::new(RecordingReporter::default());
        let service = ClusterReportService::new(
            Arc::new(FakeDirectory {
                clusters: vec![Ok(cluster("etl")), Err(failure("gone"))],
                ..FakeDirectory::default()
            }),
            reporter.clone(),
        );

        let error = service.report_cluster_names().await.unwrap_err();

        assert_eq!(error.operation, "clusters.list");
        assert_eq!(reporter.lines(), vec!["etl"]);
        assert_eq!(reporter.errors().len(), 1);
    }
}
