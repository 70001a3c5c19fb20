//! Bearer-token sources for the Databricks REST API.

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    api::{DatabricksApiEndpoint, error_message, replace_all},
    config::Credentials,
    databricks_api_endpoint,
};

/// Microsoft Entra ID login endpoint used for service principal tokens.
pub static AZURE_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
/// Application id of the Azure Databricks first-party service.
static AZURE_DATABRICKS_SCOPE: &str = "2ff814a6-3304-4ab8-85cb-cd0e6f879c1d/.default";
static OAUTH_SCOPE: &str = "all-apis";

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Errors that can occur while obtaining an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("Token request failed (error {status}): {message}")]
    TokenRequestFailed { status: u16, message: String },
    #[error(transparent)]
    Deserialize(#[from] serde_json::Error),
    #[error("Could not discover the Azure tenant for {0}")]
    TenantDiscovery(String),
}

/// Produces the `Authorization` header value for each request.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Short name of the authentication method, used in logs.
    fn auth_type(&self) -> &'static str;

    /// Value of the `Authorization` header for the next request.
    ///
    /// # Errors
    ///
    /// * If a token could not be obtained
    async fn authorization(&self, http: &reqwest::Client) -> Result<String, AuthError>;
}

/// Which token endpoint an OAuth machine-to-machine principal talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenScope {
    Workspace,
    Account { account_id: String },
}

/// Builds the provider matching `credentials` for a context rooted at `host`.
#[must_use]
pub fn credentials_provider(
    credentials: &Credentials,
    host: &str,
    scope: &TokenScope,
) -> Arc<dyn CredentialsProvider> {
    match credentials {
        Credentials::PersonalAccessToken { token } => Arc::new(PersonalAccessToken {
            token: token.clone(),
        }),
        Credentials::AzureServicePrincipal {
            client_id,
            client_secret,
            tenant_id,
        } => Arc::new(AzureServicePrincipal::new(
            host,
            client_id.as_str(),
            client_secret.as_str(),
            tenant_id.clone(),
        )),
        Credentials::OAuthMachineToMachine {
            client_id,
            client_secret,
        } => Arc::new(OAuthMachineToMachine {
            token_url: match scope {
                TokenScope::Workspace => databricks_api_endpoint!(host, OidcWorkspaceToken),
                TokenScope::Account { account_id } => databricks_api_endpoint!(
                    host,
                    OidcAccountToken,
                    &[(":accountId", account_id.as_str())]
                ),
            },
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            cache: TokenCache::default(),
        }),
    }
}

/// Static personal access token sent as a bearer token.
pub struct PersonalAccessToken {
    token: String,
}

#[async_trait]
impl CredentialsProvider for PersonalAccessToken {
    fn auth_type(&self) -> &'static str {
        "pat"
    }

    async fn authorization(&self, _http: &reqwest::Client) -> Result<String, AuthError> {
        Ok(format!("Bearer {}", self.token))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Default)]
struct TokenCache(Mutex<Option<CachedToken>>);

impl TokenCache {
    async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<TokenResponse, AuthError>> + Send,
    {
        let mut cached = self.0.lock().await;

        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.access_token.clone());
        }

        log::debug!("Refreshing access token");

        let response = refresh().await?;
        let expires_in = Duration::from_secs(response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN));
        let refresh_at = Instant::now() + expires_in.saturating_sub(EXPIRY_MARGIN);

        *cached = Some(CachedToken {
            access_token: response.access_token.clone(),
            refresh_at,
        });

        Ok(response.access_token)
    }
}

async fn request_token(request: reqwest::RequestBuilder) -> Result<TokenResponse, AuthError> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?;

    log::debug!("Received token response status: {status}");

    if !(200..300).contains(&status) {
        return Err(AuthError::TokenRequestFailed {
            status,
            message: error_message(&body),
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Microsoft Entra ID service principal using the client-credentials grant.
pub struct AzureServicePrincipal {
    host: String,
    login_base_url: String,
    client_id: String,
    client_secret: String,
    tenant_id: Option<String>,
    cache: TokenCache,
}

/// Extracts the tenant from the Entra ID login URL a Databricks host
/// redirects to, e.g. `https://login.microsoftonline.com/<tenant>/oauth2/authorize`.
#[must_use]
pub fn tenant_from_login_location(location: &str) -> Option<String> {
    let url = url::Url::parse(location).ok()?;
    url.path_segments()?
        .find(|segment| !segment.is_empty())
        .map(ToString::to_string)
}

impl AzureServicePrincipal {
    /// Creates a service principal for the Databricks workspace or account
    /// at `host`. Without a `tenant_id` the tenant is discovered from the
    /// host's login redirect.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: Option<String>,
    ) -> Self {
        Self {
            host: host.into(),
            login_base_url: AZURE_LOGIN_BASE_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id,
            cache: TokenCache::default(),
        }
    }

    /// Sends token requests to `login_base_url` instead of
    /// [`AZURE_LOGIN_BASE_URL`].
    #[must_use]
    pub fn with_login_base_url(mut self, login_base_url: impl Into<String>) -> Self {
        self.login_base_url = login_base_url.into();
        self
    }

    async fn discover_tenant(&self) -> Result<String, AuthError> {
        let url = databricks_api_endpoint!(&self.host, AadAuth);

        log::debug!("Discovering Azure tenant from {url}");

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let response = client.get(&url).send().await?;

        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|location| location.to_str().ok())
            .and_then(tenant_from_login_location)
            .ok_or_else(|| AuthError::TenantDiscovery(self.host.clone()))
    }

    async fn fetch_token(&self, http: &reqwest::Client) -> Result<TokenResponse, AuthError> {
        let tenant_id = match &self.tenant_id {
            Some(tenant_id) => tenant_id.clone(),
            None => self.discover_tenant().await?,
        };
        let url = format!(
            "{}/{tenant_id}/oauth2/v2.0/token",
            self.login_base_url.trim_end_matches('/')
        );

        request_token(http.post(url).form(&[
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", AZURE_DATABRICKS_SCOPE),
        ]))
        .await
    }
}

#[async_trait]
impl CredentialsProvider for AzureServicePrincipal {
    fn auth_type(&self) -> &'static str {
        "azure-client-secret"
    }

    async fn authorization(&self, http: &reqwest::Client) -> Result<String, AuthError> {
        let token = self.cache.get_or_refresh(|| self.fetch_token(http)).await?;
        Ok(format!("Bearer {token}"))
    }
}

/// Databricks OAuth machine-to-machine client, authenticated with HTTP
/// basic auth against the workspace or account OIDC token endpoint.
pub struct OAuthMachineToMachine {
    token_url: String,
    client_id: String,
    client_secret: String,
    cache: TokenCache,
}

impl OAuthMachineToMachine {
    async fn fetch_token(&self, http: &reqwest::Client) -> Result<TokenResponse, AuthError> {
        request_token(
            http.post(&self.token_url)
                .basic_auth(&self.client_id, Some(&self.client_secret))
                .form(&[("grant_type", "client_credentials"), ("scope", OAUTH_SCOPE)]),
        )
        .await
    }
}

#[async_trait]
impl CredentialsProvider for OAuthMachineToMachine {
    fn auth_type(&self) -> &'static str {
        "oauth-m2m"
    }

    async fn authorization(&self, http: &reqwest::Client) -> Result<String, AuthError> {
        let token = self.cache.get_or_refresh(|| self.fetch_token(http)).await?;
        Ok(format!("Bearer {token}"))
    }
}
