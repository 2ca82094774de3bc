//! Record fetchers and managed-fetch configuration.
//!
//! A [`Fetcher`] returns one page of records plus the total count. Giving
//! the table a fetcher switches it into managed-fetch mode: the table owns
//! page and page size, calls the fetcher when either changes, and tracks
//! loading and error state itself.
//!
//! # Example
//!
//! ```
//! use tabula_lib::fetch::{fetcher_fn, FetchConfig, FetchResult};
//!
//! let config = FetchConfig::new(fetcher_fn(|params| async move {
//!     let start = (params.page - 1) * params.page_size;
//!     let rows: Vec<u32> = (start..start + params.page_size).collect();
//!     Ok(FetchResult::new(rows, 1000))
//! }))
//! .extra_param("status", "active");
//! assert!(config.is_auto_fetch());
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde_json::Map;
use serde_json::Value;

use crate::error::FetchError;

const PAGE_KEY: &str = "page";
const PAGE_SIZE_KEY: &str = "pageSize";

/// Parameters passed to a fetcher.
///
/// Serializes flat: `{"page": 1, "pageSize": 10, ...extra}`. An extra
/// named `page` or `pageSize` replaces the built-in value on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    /// Requested page, 1-indexed.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Caller-supplied extra parameters (filters, search terms).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FetchParams {
    /// Create parameters with no extras.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            extra: Map::new(),
        }
    }

    /// Built-in keys not overridden by an extra.
    fn base_pairs(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        [(PAGE_KEY, self.page), (PAGE_SIZE_KEY, self.page_size)]
            .into_iter()
            .filter(|(key, _)| !self.extra.contains_key(*key))
    }

    /// Flatten into query pairs. Strings are unquoted, null is skipped,
    /// nested values are JSON-encoded.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .base_pairs()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        for (key, value) in &self.extra {
            match value {
                Value::Null => {}
                Value::String(s) => pairs.push((key.clone(), s.clone())),
                other => pairs.push((key.clone(), other.to_string())),
            }
        }
        pairs
    }
}

impl Serialize for FetchParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.base_pairs() {
            map.serialize_entry(key, &value)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One page of records and the total across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> FetchResult<T> {
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self { data, total }
    }
}

/// Source of paginated records.
///
/// Implementations must return an error on failure rather than an empty
/// page, so the table can tell "nothing there" from "could not load".
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Fetch one page.
    async fn fetch(&self, params: FetchParams) -> Result<FetchResult<T>, FetchError>;
}

type FetchFn<T> =
    dyn Fn(FetchParams) -> BoxFuture<'static, Result<FetchResult<T>, FetchError>> + Send + Sync;

/// [`Fetcher`] backed by a closure. Created with [`fetcher_fn`].
pub struct FnFetcher<T> {
    f: Box<FetchFn<T>>,
}

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher_fn<T, F, Fut>(f: F) -> FnFetcher<T>
where
    F: Fn(FetchParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResult<T>, FetchError>> + Send + 'static,
{
    FnFetcher {
        f: Box::new(move |params| f(params).boxed()),
    }
}

#[async_trait]
impl<T: Send + 'static> Fetcher<T> for FnFetcher<T> {
    async fn fetch(&self, params: FetchParams) -> Result<FetchResult<T>, FetchError> {
        (self.f)(params).await
    }
}

/// Opaque token whose change forces a refetch.
///
/// Only inequality matters: bump it to bust the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RefreshKey(u64);

impl RefreshKey {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The next key.
    pub fn bump(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Managed-fetch configuration.
pub struct FetchConfig<T> {
    pub(crate) fetcher: Arc<dyn Fetcher<T>>,
    pub(crate) extra_params: Map<String, Value>,
    pub(crate) auto_fetch: bool,
    pub(crate) refresh_key: Option<RefreshKey>,
}

impl<T> FetchConfig<T> {
    /// Create a config that fetches automatically.
    pub fn new(fetcher: impl Fetcher<T> + 'static) -> Self {
        Self::from_arc(Arc::new(fetcher))
    }

    /// Create a config from a shared fetcher.
    pub fn from_arc(fetcher: Arc<dyn Fetcher<T>>) -> Self {
        Self {
            fetcher,
            extra_params: Map::new(),
            auto_fetch: true,
            refresh_key: None,
        }
    }

    /// Replace all extra parameters.
    pub fn extra_params(mut self, params: Map<String, Value>) -> Self {
        self.extra_params = params;
        self
    }

    /// Add one extra parameter.
    pub fn extra_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    /// Turn automatic fetching on or off.
    pub fn auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    /// Set the initial refresh key.
    pub fn refresh_key(mut self, key: RefreshKey) -> Self {
        self.refresh_key = Some(key);
        self
    }

    pub fn is_auto_fetch(&self) -> bool {
        self.auto_fetch
    }
}

impl<T> Clone for FetchConfig<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            extra_params: self.extra_params.clone(),
            auto_fetch: self.auto_fetch,
            refresh_key: self.refresh_key,
        }
    }
}

impl<T> std::fmt::Debug for FetchConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchConfig")
            .field("extra_params", &self.extra_params)
            .field("auto_fetch", &self.auto_fetch)
            .field("refresh_key", &self.refresh_key)
            .finish_non_exhaustive()
    }
}

/// Inputs whose change triggers an automatic refetch.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FetchDeps {
    pub page: u32,
    pub page_size: u32,
    pub extra: Map<String, Value>,
    pub refresh_key: Option<RefreshKey>,
}
