//! Typed entity records and the generic resource client.
//!
//! DESIGN
//! ======
//! Every business entity follows the same REST shape: a paginated list, a
//! detail endpoint and create/update/delete. [`Resource`] names the endpoint
//! and permission resource for a record type; [`ResourceApi`] implements the
//! calls once, on top of the shared [`HttpClient`] and [`QueryCache`].
//!
//! Records validate themselves with `validator` before any create or update
//! is sent, so a form gets inline errors without a round-trip. The server
//! remains the authority: its 4xx body comes back as [`HttpError::Api`].

pub mod accounting;
pub mod admin;
pub mod commodity;
pub mod common;
pub mod dispatch;
pub mod equipment;
pub mod reports;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use validator::Validate;

pub use common::{RecordMeta, SelectOption, Status};

use crate::cache::QueryCache;
use crate::http::{HttpClient, HttpError, Query, RequestBody};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const OPTIONS_LIMIT: u32 = 20;
pub const DEFAULT_STALE: Duration = Duration::from_secs(30);

// =============================================================================
// RESOURCE TRAITS
// =============================================================================

/// A record type served under a REST collection.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Collection path relative to the API root, with trailing slash.
    const PATH: &'static str;
    /// Resource name used in the permission manifest and cache keys.
    const NAME: &'static str;

    fn meta(&self) -> &RecordMeta;

    /// Human-readable label for select dropdowns.
    fn label(&self) -> String;

    fn id(&self) -> Option<&str> {
        self.meta().id.as_deref()
    }
}

/// A resource the client may create, update and delete.
pub trait WritableResource: Resource + Validate {}

// =============================================================================
// LIST PARAMS / PAGE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

/// Limit/offset pagination plus free-text search, filters and sort.
#[derive(Clone, Debug, PartialEq)]
pub struct ListParams {
    pub limit: u32,
    pub offset: u32,
    pub query: Option<String>,
    pub filters: Map<String, Value>,
    pub sort: Vec<SortField>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            query: None,
            filters: Map::new(),
            sort: Vec::new(),
        }
    }
}

impl ListParams {
    #[must_use]
    pub fn to_query(&self) -> Query {
        let sort: Vec<String> = self
            .sort
            .iter()
            .map(|s| {
                let dir = match s.direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                format!("{}:{dir}", s.field)
            })
            .collect();

        Query::new()
            .push("limit", self.limit)
            .push("offset", self.offset)
            .push_opt("query", self.query.as_deref().map(str::trim))
            .push("sort", sort.join(","))
            .extend(Query::from_object(&Value::Object(self.filters.clone())))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default, alias = "prev")]
    pub previous: Option<String>,
}

// =============================================================================
// RESOURCE API
// =============================================================================

pub struct ResourceApi<T> {
    http: Arc<HttpClient>,
    cache: Arc<QueryCache>,
    stale: Duration,
    _record: PhantomData<fn() -> T>,
}

impl<T: Resource> ResourceApi<T> {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { http, cache, stale: DEFAULT_STALE, _record: PhantomData }
    }

    #[must_use]
    pub fn with_stale(mut self, stale: Duration) -> Self {
        self.stale = stale;
        self
    }

    /// Cache-key prefix covering every query of this resource.
    #[must_use]
    pub fn cache_prefix() -> String {
        format!("{}/", T::NAME)
    }

    fn detail_path(id: &str) -> String {
        format!("{}{id}/", T::PATH)
    }

    /// Fetch one page, served from cache while fresh.
    ///
    /// # Errors
    ///
    /// Propagates [`HttpError`] from the request or decoding.
    pub async fn list(&self, params: &ListParams) -> Result<Page<T>, HttpError> {
        let query = params.to_query();
        let key = list_key(T::NAME, &query);
        let value = self
            .cache
            .get_or_fetch(&key, self.stale, || self.http.get::<Value>(T::PATH, &query))
            .await?;
        serde_json::from_value(value).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// # Errors
    ///
    /// Propagates [`HttpError`] from the request or decoding.
    pub async fn get(&self, id: &str) -> Result<T, HttpError> {
        let key = format!("{}/detail/{id}", T::NAME);
        let path = Self::detail_path(id);
        let query = Query::new();
        let value = self
            .cache
            .get_or_fetch(&key, self.stale, || self.http.get::<Value>(&path, &query))
            .await?;
        serde_json::from_value(value).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Search for autocomplete options; bypasses the cache.
    ///
    /// # Errors
    ///
    /// Propagates [`HttpError`] from the request.
    pub async fn options(&self, search: &str) -> Result<Vec<SelectOption>, HttpError> {
        let query = Query::new().push("limit", OPTIONS_LIMIT).push("query", search.trim());
        let page: Page<T> = self.http.get(T::PATH, &query).await?;
        Ok(page
            .results
            .iter()
            .filter_map(|r| {
                r.id().map(|id| SelectOption { value: id.to_owned(), label: r.label() })
            })
            .collect())
    }
}

impl<T: WritableResource> ResourceApi<T> {
    /// Validate then `POST` a new record.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Validation`] without sending when the record is
    /// invalid, otherwise propagates request errors.
    pub async fn create(&self, record: &T) -> Result<T, HttpError> {
        record.validate()?;
        let created: T = self.http.post(T::PATH, &RequestBody::json(record)?).await?;
        self.cache.invalidate_prefix(&Self::cache_prefix());
        info!(resource = T::NAME, id = created.id().unwrap_or_default(), "record created");
        Ok(created)
    }

    /// Validate then `PUT` an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Validation`] for an invalid record and
    /// [`HttpError::InvalidUrl`] when the record has no id.
    pub async fn update(&self, record: &T) -> Result<T, HttpError> {
        record.validate()?;
        let id = record
            .id()
            .ok_or_else(|| HttpError::InvalidUrl(format!("{} record has no id", T::NAME)))?;
        let updated: T = self.http.put(&Self::detail_path(id), &RequestBody::json(record)?).await?;
        self.cache.invalidate_prefix(&Self::cache_prefix());
        info!(resource = T::NAME, id, "record updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Propagates [`HttpError`] from the request.
    pub async fn delete(&self, id: &str) -> Result<(), HttpError> {
        self.http.delete(&Self::detail_path(id)).await?;
        self.cache.invalidate_prefix(&Self::cache_prefix());
        info!(resource = T::NAME, id, "record deleted");
        Ok(())
    }
}

fn list_key(name: &str, query: &Query) -> String {
    let params: Vec<String> = query.pairs().iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{name}/list/{}", params.join("&"))
}
