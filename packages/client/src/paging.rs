//! Lazy pagination over the Databricks list endpoints.
//!
//! The SCIM endpoints page by index with a known total, the clusters
//! endpoint pages by an opaque token. Both are represented as a [`Page`] and
//! turned into a single item stream by [`paginate`], which only requests the
//! next page once the current one has been consumed.

use std::future::Future;

use futures::{StreamExt as _, TryStreamExt as _, stream::BoxStream};

use crate::Error;

/// A single page of items from a paginated list call.
#[derive(Debug)]
pub enum Page<T> {
    /// Index based pagination with a known total number of items.
    WithTotal {
        items: Vec<T>,
        /// Zero-based position of the first item of this page.
        offset: u32,
        limit: u32,
        total: u32,
    },
    /// Token based pagination. `next_token` is `None` on the last page.
    WithCursor {
        items: Vec<T>,
        offset: u32,
        limit: u32,
        next_token: Option<String>,
    },
}

/// The page a fetch should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
    pub token: Option<String>,
}

impl PageRequest {
    /// Request for the first page of `limit` items.
    #[must_use]
    pub const fn first(limit: u32) -> Self {
        Self {
            offset: 0,
            limit,
            token: None,
        }
    }

    /// SCIM indexes are 1-based.
    #[must_use]
    pub const fn start_index(&self) -> u32 {
        self.offset + 1
    }
}

impl<T> Page<T> {
    /// Items of this page.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn items(&self) -> &[T] {
        match self {
            Self::WithTotal { items, .. } | Self::WithCursor { items, .. } => items,
        }
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::WithTotal { items, .. } | Self::WithCursor { items, .. } => items,
        }
    }

    /// Total number of items across all pages, when the endpoint reports it.
    #[must_use]
    pub const fn total(&self) -> Option<u32> {
        match self {
            Self::WithTotal { total, .. } => Some(*total),
            Self::WithCursor { .. } => None,
        }
    }

    fn consumed(&self) -> u32 {
        match self {
            Self::WithTotal { items, offset, .. } | Self::WithCursor { items, offset, .. } => {
                offset.saturating_add(u32::try_from(items.len()).unwrap_or(u32::MAX))
            }
        }
    }

    /// The request for the page after this one, or `None` if this is the
    /// last page. An empty page always ends the listing so a service that
    /// misreports its total cannot cause an endless loop.
    #[must_use]
    pub fn next_request(&self) -> Option<PageRequest> {
        if self.items().is_empty() {
            return None;
        }

        let offset = self.consumed();

        match self {
            Self::WithTotal { limit, total, .. } => (offset < *total).then(|| PageRequest {
                offset,
                limit: *limit,
                token: None,
            }),
            Self::WithCursor {
                limit, next_token, ..
            } => next_token.as_ref().map(|token| PageRequest {
                offset,
                limit: *limit,
                token: Some(token.clone()),
            }),
        }
    }
}

/// Turns a page fetcher into a lazy stream of items.
///
/// `fetch` is called with `first`, then with each [`Page::next_request`]
/// until there is none. The stream ends after the first error.
pub fn paginate<'a, T, F, Fut>(first: PageRequest, fetch: F) -> BoxStream<'a, Result<T, Error>>
where
    T: Send + 'a,
    F: FnMut(PageRequest) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Page<T>, Error>> + Send + 'a,
{
    futures::stream::try_unfold((Some(first), fetch), |(request, mut fetch)| async move {
        let Some(request) = request else {
            return Ok::<_, Error>(None);
        };

        log::trace!("Fetching page {request:?}");

        let page = fetch(request).await?;
        let next = page.next_request();
        let items = futures::stream::iter(page.into_items().into_iter().map(Ok::<T, Error>));

        Ok(Some((items, (next, fetch))))
    })
    .try_flatten()
    .boxed()
}
