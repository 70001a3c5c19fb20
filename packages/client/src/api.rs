//! Endpoint table and the authenticated HTTP plumbing shared by every
//! Databricks client context.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::{Error, auth::CredentialsProvider};

/// `User-Agent` sent with every request.
pub static USER_AGENT: &str = concat!("dbx_demo/", env!("CARGO_PKG_VERSION"));

/// Databricks REST endpoints used by the clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabricksApiEndpoint {
    WorkspaceUsers,
    WorkspaceGroups,
    AccountUsers,
    AccountGroups,
    Clusters,
    DbfsList,
    AadAuth,
    OidcWorkspaceToken,
    OidcAccountToken,
}

impl DatabricksApiEndpoint {
    #[must_use]
    pub fn to_url(self, host: &str) -> String {
        let host = host.trim_end_matches('/');

        match self {
            Self::WorkspaceUsers => format!("{host}/api/2.0/preview/scim/v2/Users"),
            Self::WorkspaceGroups => format!("{host}/api/2.0/preview/scim/v2/Groups"),
            Self::AccountUsers => format!("{host}/api/2.0/accounts/:accountId/scim/v2/Users"),
            Self::AccountGroups => format!("{host}/api/2.0/accounts/:accountId/scim/v2/Groups"),
            Self::Clusters => format!("{host}/api/2.1/clusters/list"),
            Self::DbfsList => format!("{host}/api/2.0/dbfs/list"),
            Self::AadAuth => format!("{host}/aad/auth"),
            Self::OidcWorkspaceToken => format!("{host}/oidc/v1/token"),
            Self::OidcAccountToken => format!("{host}/oidc/accounts/:accountId/v1/token"),
        }
    }
}

#[must_use]
pub fn replace_all(value: &str, params: &[(&str, &str)]) -> String {
    let mut string = value.to_string();

    for (key, value) in params {
        string = string.replace(key, value);
    }

    string
}

#[must_use]
pub fn attach_query_string<K: AsRef<str>, V: AsRef<str>>(value: &str, query: &[(K, V)]) -> String {
    if query.is_empty() {
        return value.to_string();
    }

    let mut query_string = form_urlencoded::Serializer::new(String::new());

    for (key, value) in query {
        query_string.append_pair(key.as_ref(), value.as_ref());
    }

    format!("{}?{}", value, &query_string.finish())
}

#[macro_export]
macro_rules! databricks_api_endpoint {
    ($host:expr, $name:ident $(,)?) => {
        DatabricksApiEndpoint::$name.to_url($host)
    };

    ($host:expr, $name:ident, $params:expr) => {
        replace_all(&databricks_api_endpoint!($host, $name), $params)
    };

    ($host:expr, $name:ident, $params:expr, $query:expr) => {
        attach_query_string(&databricks_api_endpoint!($host, $name, $params), $query)
    };
}

/// Best-effort human readable message from a Databricks or OAuth error body.
#[must_use]
pub fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "detail", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|x| x.as_str()).map(ToString::to_string))
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

fn check_status(status: u16, body: &[u8]) -> Result<(), Error> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(Error::Unauthorized(error_message(body))),
        _ => Err(Error::RequestFailed {
            status,
            message: error_message(body),
        }),
    }
}

/// Authenticated JSON client bound to a single Databricks host.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    host: String,
    credentials: Arc<dyn CredentialsProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("host", &self.host)
            .field("auth_type", &self.credentials.auth_type())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `host` that sends the `dbx_demo` user agent.
    ///
    /// # Errors
    ///
    /// * If the underlying HTTP client could not be built
    pub fn new(
        host: impl Into<String>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            host: host.into(),
            credentials,
        })
    }

    /// Base URL of the Databricks host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Sends an authenticated `GET` to `url` and deserializes the JSON body.
    ///
    /// # Errors
    ///
    /// * If no token could be obtained
    /// * If the request fails or returns a non-success status
    /// * If the response body does not match `T`
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        log::debug!("Making authenticated request to {url}");

        let authorization = self.credentials.authorization(&self.http).await?;

        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        dbx_demo_logging::debug_or_trace!(
            ("Received response status={status} bytes={}", body.len()),
            (
                "Received response status={status}: {}",
                String::from_utf8_lossy(&body)
            )
        );

        check_status(status, &body)?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test]
    fn builds_account_scim_url_with_query() {
        let url = databricks_api_endpoint!(
            "https://accounts.cloud.databricks.com/",
            AccountUsers,
            &[(":accountId", "abc-123")],
            &[("startIndex", "1"), ("filter", "userName co \"x\"")]
        );

        assert_eq!(
            url,
            "https://accounts.cloud.databricks.com/api/2.0/accounts/abc-123/scim/v2/Users?startIndex=1&filter=userName+co+%22x%22"
        );
    }

    #[test_log::test]
    fn empty_query_leaves_url_untouched() {
        let query: [(&str, &str); 0] = [];

        assert_eq!(
            attach_query_string("https://h/api/2.1/clusters/list", &query),
            "https://h/api/2.1/clusters/list"
        );
    }

    #[test_log::test]
    fn error_message_prefers_json_fields() {
        assert_eq!(
            error_message(br#"{"error_code":"INVALID_PARAMETER_VALUE","message":"bad filter"}"#),
            "bad filter"
        );
        assert_eq!(
            error_message(br#"{"schemas":[],"detail":"User not authorized","status":"403"}"#),
            "User not authorized"
        );
        assert_eq!(error_message(b"  upstream timeout \n"), "upstream timeout");
    }

    #[test_log::test]
    fn status_mapping() {
        assert!(check_status(200, b"").is_ok());
        assert!(matches!(
            check_status(403, br#"{"detail":"nope"}"#),
            Err(Error::Unauthorized(message)) if message == "nope"
        ));
        assert!(matches!(
            check_status(503, b"busy"),
            Err(Error::RequestFailed { status: 503, .. })
        ));
    }
}
