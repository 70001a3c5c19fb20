use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

use crate::paging::{Page, PageRequest};

/// SCIM user attributes that can be requested, sorted on or filtered by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, AsRefStr, Serialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UserAttribute {
    Id,
    UserName,
    DisplayName,
    Active,
    Emails,
}

/// Direction of the remote `sortBy` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Parameters of a `users.list` call. The filter expression is SCIM syntax
/// (e.g. `userName co gc`) and is evaluated by the remote service only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCriteria {
    pub attributes: BTreeSet<UserAttribute>,
    pub sort_by: UserAttribute,
    pub filter: String,
    pub sort_order: SortOrder,
}

impl QueryCriteria {
    /// Creates criteria for a `users.list` call.
    #[must_use]
    pub fn new(
        attributes: impl IntoIterator<Item = UserAttribute>,
        sort_by: UserAttribute,
        filter: impl Into<String>,
        sort_order: SortOrder,
    ) -> Self {
        Self {
            attributes: attributes.into_iter().collect(),
            sort_by,
            filter: filter.into(),
            sort_order,
        }
    }

    /// Query string pairs for the SCIM list endpoints. The filter is sent
    /// as given, including an empty one.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![];

        if !self.attributes.is_empty() {
            query.push((
                "attributes",
                self.attributes
                    .iter()
                    .map(AsRef::as_ref)
                    .collect::<Vec<&str>>()
                    .join(","),
            ));
        }

        query.push(("sortBy", self.sort_by.as_ref().to_string()));
        query.push(("sortOrder", self.sort_order.as_ref().to_string()));

        query.push(("filter", self.filter.clone()));

        query
    }
}

/// A SCIM user. `id` and `userName` are always present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: String,
    pub user_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// A SCIM group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntity {
    #[serde(default)]
    pub id: Option<String>,
    pub display_name: String,
}

/// An entry of the clusters list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterEntity {
    pub cluster_id: String,
    pub cluster_name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub spark_version: Option<String>,
}

/// An entry of a DBFS directory listing. `path` is absolute, e.g. `/FileStore/tables`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntity {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub modification_time: Option<i64>,
}

/// Envelope of the SCIM `Users`/`Groups` list endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ScimListResponse<T> {
    pub total_results: u32,
    #[serde(rename = "Resources", default)]
    pub resources: Vec<T>,
}

impl<T> ScimListResponse<T> {
    pub fn into_page(self, request: &PageRequest) -> Page<T> {
        Page::WithTotal {
            items: self.resources,
            offset: request.offset,
            limit: request.limit,
            total: self.total_results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClusterListResponse {
    #[serde(default)]
    pub clusters: Vec<ClusterEntity>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ClusterListResponse {
    pub fn into_page(self, request: &PageRequest) -> Page<ClusterEntity> {
        Page::WithCursor {
            items: self.clusters,
            offset: request.offset,
            limit: request.limit,
            next_token: self.next_page_token.filter(|token| !token.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DbfsListResponse {
    #[serde(default)]
    pub files: Vec<FileEntity>,
}

impl DbfsListResponse {
    pub fn into_page(self, request: &PageRequest) -> Page<FileEntity> {
        Page::WithCursor {
            items: self.files,
            offset: request.offset,
            limit: request.limit,
            next_token: None,
        }
    }
}
