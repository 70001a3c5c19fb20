use std::sync::Arc;

use futures::stream::BoxStream;
use serde::de::DeserializeOwned;

use crate::{
    ClusterDirectory, Error, FileDirectory, UserDirectory,
    api::{ApiClient, DatabricksApiEndpoint, attach_query_string, replace_all},
    auth::{CredentialsProvider, TokenScope, credentials_provider},
    config::{AccountConfig, Credentials, WorkspaceConfig},
    databricks_api_endpoint,
    models::{
        ClusterEntity, ClusterListResponse, DbfsListResponse, FileEntity, GroupEntity,
        QueryCriteria, ScimListResponse, UserEntity,
    },
    paging::{PageRequest, paginate},
};

/// Items requested per page unless overridden with `with_page_size`.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

static GROUP_ATTRIBUTES: &str = "id,displayName";

/// Client for a single Databricks workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    api: ApiClient,
    page_size: u32,
}

/// Client for the Databricks account console.
#[derive(Debug, Clone)]
pub struct AccountClient {
    api: ApiClient,
    account_id: String,
    page_size: u32,
}

impl WorkspaceClient {
    /// Creates a workspace client that authenticates with `credentials`.
    ///
    /// # Errors
    ///
    /// * If the HTTP client cannot be built
    pub fn new(
        host: impl Into<String>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, Error> {
        Ok(Self {
            api: ApiClient::new(host, credentials)?,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Creates a workspace client from a resolved profile.
    ///
    /// # Errors
    ///
    /// * If the HTTP client cannot be built
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self, Error> {
        Self::with_credentials(&config.host, &config.credentials)
    }

    /// Creates a workspace client for `host` using the matching credentials provider.
    ///
    /// # Errors
    ///
    /// * If the HTTP client cannot be built
    pub fn with_credentials(host: &str, credentials: &Credentials) -> Result<Self, Error> {
        Self::new(
            host,
            credentials_provider(credentials, host, &TokenScope::Workspace),
        )
    }

    /// Sets the number of items requested per page.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Base URL of the Databricks host this client talks to.
    #[must_use]
    pub fn host(&self) -> &str {
        self.api.host()
    }
}

impl AccountClient {
    /// Creates an account client that authenticates with `credentials`.
    ///
    /// # Errors
    ///
    /// * If the HTTP client cannot be built
    pub fn new(
        host: impl Into<String>,
        account_id: impl Into<String>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, Error> {
        Ok(Self {
            api: ApiClient::new(host, credentials)?,
            account_id: account_id.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Creates an account client from the account settings.
    ///
    /// # Errors
    ///
    /// * If the HTTP client cannot be built
    pub fn from_config(config: &AccountConfig) -> Result<Self, Error> {
        let scope = TokenScope::Account {
            account_id: config.account_id.clone(),
        };

        Self::new(
            config.host.as_str(),
            config.account_id.as_str(),
            credentials_provider(&config.credentials, &config.host, &scope),
        )
    }

    /// Sets the number of items requested per page.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Base URL of the Databricks host this client talks to.
    #[must_use]
    pub fn host(&self) -> &str {
        self.api.host()
    }

    /// Databricks account this client is scoped to.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

/// Streams every resource of a SCIM list endpoint, `page_size` at a time.
fn scim_list<'a, T>(
    api: &'a ApiClient,
    url: String,
    query: Vec<(&'static str, String)>,
    page_size: u32,
) -> BoxStream<'a, Result<T, Error>>
where
    T: DeserializeOwned + Send + 'a,
{
    paginate(PageRequest::first(page_size), move |request| {
        let mut query = query.clone();
        query.push(("startIndex", request.start_index().to_string()));
        query.push(("count", request.limit.to_string()));
        let url = attach_query_string(&url, &query);

        async move {
            let response: ScimListResponse<T> = api.get(&url).await?;
            Ok(response.into_page(&request))
        }
    })
}

impl UserDirectory for WorkspaceClient {
    fn list_users(&self, criteria: QueryCriteria) -> BoxStream<'_, Result<UserEntity, Error>> {
        scim_list(
            &self.api,
            databricks_api_endpoint!(self.host(), WorkspaceUsers),
            criteria.to_query(),
            self.page_size,
        )
    }

    fn list_groups(&self) -> BoxStream<'_, Result<GroupEntity, Error>> {
        scim_list(
            &self.api,
            databricks_api_endpoint!(self.host(), WorkspaceGroups),
            vec![("attributes", GROUP_ATTRIBUTES.to_string())],
            self.page_size,
        )
    }
}

impl UserDirectory for AccountClient {
    fn list_users(&self, criteria: QueryCriteria) -> BoxStream<'_, Result<UserEntity, Error>> {
        scim_list(
            &self.api,
            databricks_api_endpoint!(
                self.host(),
                AccountUsers,
                &[(":accountId", self.account_id.as_str())]
            ),
            criteria.to_query(),
            self.page_size,
        )
    }

    fn list_groups(&self) -> BoxStream<'_, Result<GroupEntity, Error>> {
        scim_list(
            &self.api,
            databricks_api_endpoint!(
                self.host(),
                AccountGroups,
                &[(":accountId", self.account_id.as_str())]
            ),
            vec![("attributes", GROUP_ATTRIBUTES.to_string())],
            self.page_size,
        )
    }
}

impl ClusterDirectory for WorkspaceClient {
    fn list_clusters(&self) -> BoxStream<'_, Result<ClusterEntity, Error>> {
        let base = databricks_api_endpoint!(self.host(), Clusters);

        paginate(PageRequest::first(self.page_size), move |request| {
            let mut query = vec![("page_size", request.limit.to_string())];
            if let Some(token) = &request.token {
                query.push(("page_token", token.clone()));
            }
            let url = attach_query_string(&base, &query);

            async move {
                let response: ClusterListResponse = self.api.get(&url).await?;
                Ok(response.into_page(&request))
            }
        })
    }
}

impl FileDirectory for WorkspaceClient {
    fn list_files(&self, path: &str) -> BoxStream<'_, Result<FileEntity, Error>> {
        let url = databricks_api_endpoint!(self.host(), DbfsList, &[], &[("path", path)]);

        paginate(PageRequest::first(self.page_size), move |request| {
            let url = url.clone();

            async move {
                let response: DbfsListResponse = self.api.get(&url).await?;
                Ok(response.into_page(&request))
            }
        })
    }
}
