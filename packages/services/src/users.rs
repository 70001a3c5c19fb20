use std::sync::Arc;

use dbx_demo_client::{QueryCriteria, SortOrder, UserAttribute, UserDirectory, UserEntity};
use futures::{TryStreamExt as _, stream::BoxStream};
use serde::Serialize;

use crate::{RemoteQueryError, Reporter, reported};

/// The two fields of a remote user that callers get back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub user_name: String,
}

impl From<UserEntity> for UserRecord {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            user_name: value.user_name,
        }
    }
}

/// Identity queries against either a workspace or an account context.
pub struct UserQueryService<C: UserDirectory> {
    client: Arc<C>,
    reporter: Arc<dyn Reporter>,
}

impl<C: UserDirectory> UserQueryService<C> {
    /// Creates a service querying identities through `client`.
    #[must_use]
    pub const fn new(client: Arc<C>, reporter: Arc<dyn Reporter>) -> Self {
        Self { client, reporter }
    }

    /// Lazily lists the users matching `criteria`, exactly as the remote
    /// service returns them.
    pub fn query_users(
        &self,
        criteria: QueryCriteria,
    ) -> BoxStream<'_, Result<UserEntity, RemoteQueryError>> {
        let context = format!("Error listing users with filter '{}'", criteria.filter);

        log::debug!("Listing users: {criteria:?}");

        reported(
            self.client.list_users(criteria),
            self.reporter.clone(),
            "users.list",
            context,
        )
    }

    /// Users matching `filter`, sorted by user name descending on the
    /// remote side, projected to [`UserRecord`]s in the order received.
    ///
    /// # Errors
    ///
    /// * If any page fails; records collected so far are discarded
    pub async fn get_filtered_users(
        &self,
        filter: &str,
    ) -> Result<Vec<UserRecord>, RemoteQueryError> {
        let criteria = QueryCriteria::new(
            [UserAttribute::Id, UserAttribute::UserName],
            UserAttribute::UserName,
            filter,
            SortOrder::Descending,
        );

        self.query_users(criteria)
            .map_ok(UserRecord::from)
            .try_collect()
            .await
    }

    /// Display names of every group in the context's scope.
    ///
    /// # Errors
    ///
    /// * If any page fails
    pub async fn list_groups(&self) -> Result<Vec<String>, RemoteQueryError> {
        log::debug!("Listing groups");

        reported(
            self.client.list_groups(),
            self.reporter.clone(),
            "groups.list",
            "Error listing groups".to_string(),
        )
        .map_ok(|group| group.display_name)
        .try_collect()
        .await
    }
}
