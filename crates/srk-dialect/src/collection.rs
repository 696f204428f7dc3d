//! Server-assigned kinds: collection POST on create, access by `_id` after.
//!
//! Some dialects have no per-id GET for a kind; the object is then recovered
//! by an exact-match filtered search on the internal config index
//! ([`SearchLocatedApi`]).

use serde_json::{json, Value};
use srk_cluster::{CancelToken, ClusterHandle, ClusterRequest, Method};
use srk_schemas::{Dialect, ResourceIdentity, ResourceKind, WireContext};
use tracing::debug;

use crate::api::{assigned_id, segment, Envelope, ResourceApi};
use crate::classify::{send, ApiError};
use crate::routes::Routes;

// ---------------------------------------------------------------------------
// SearchLocator
// ---------------------------------------------------------------------------

/// Exact-match term search over an internal index whose documents wrap the
/// object under `field` (`{"destination": {...}}`).
#[derive(Debug, Clone)]
pub struct SearchLocator {
    pub index: &'static str,
    pub field: &'static str,
    /// Keyword sub-field holding the object name, e.g. `destination.name.keyword`.
    pub name_term: &'static str,
}

impl SearchLocator {
    /// Hits for `term_field == value` among documents carrying `field`.
    /// A missing index means no hits.
    fn hits(
        &self,
        handle: &ClusterHandle,
        term_field: &str,
        value: &str,
        cancel: &CancelToken,
    ) -> Result<(Vec<Value>, WireContext), ApiError> {
        let query = json!({
            "size": 10,
            "query": {
                "bool": {
                    "filter": [
                        { "term": { term_field: value } },
                        { "exists": { "field": self.field } }
                    ]
                }
            }
        });
        let req = ClusterRequest::new(Method::Post, format!("/{}/_search", self.index))
            .with_body(query);
        let wire = WireContext::request(req.method.as_str(), req.path.clone());

        let resp = match send(handle, req, cancel) {
            Ok(v) => v,
            Err(e) if e.is_not_found() => return Ok((Vec::new(), wire)),
            Err(e) => return Err(e),
        };
        let hits = resp
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ApiError::fatal("search response has no hits array", wire.clone()))?;
        debug!(index = self.index, term = term_field, hits = hits.len(), "filtered search");
        Ok((hits, wire))
    }

    /// The one object whose `_id` is `id`.
    pub fn find_by_id(
        &self,
        handle: &ClusterHandle,
        id: &ResourceIdentity,
        cancel: &CancelToken,
    ) -> Result<Value, ApiError> {
        let (mut hits, wire) = self.hits(handle, "_id", &id.id, cancel)?;
        match hits.len() {
            0 => Err(ApiError::not_found(
                format!("no {} with id '{}' in {}", self.field, id, self.index),
                wire,
            )),
            1 => {
                let hit = hits.remove(0);
                hit.pointer(&format!("/_source/{}", self.field))
                    .cloned()
                    .ok_or_else(|| {
                        ApiError::fatal(format!("hit has no _source.{}", self.field), wire)
                    })
            }
            n => Err(ApiError::fatal(
                format!("ambiguous identity '{id}': {n} hits in {}", self.index),
                wire,
            )),
        }
    }

    /// The identity of the one object named `name`, if any.
    pub fn find_by_name(
        &self,
        handle: &ClusterHandle,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Option<ResourceIdentity>, ApiError> {
        let (hits, wire) = self.hits(handle, self.name_term, name, cancel)?;
        match hits.as_slice() {
            [] => Ok(None),
            [hit] => assigned_id(hit, &wire).map(Some),
            many => Err(ApiError::fatal(
                format!(
                    "ambiguous identity '{name}': {} hits in {}",
                    many.len(),
                    self.index
                ),
                wire,
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// CollectionApi
// ---------------------------------------------------------------------------

/// `POST {collection}` assigns the id; `GET|PUT|DELETE {collection}/{id}`.
#[derive(Debug)]
pub struct CollectionApi {
    handle: ClusterHandle,
    kind: ResourceKind,
    routes: &'static Routes,
    collection: String,
    field: &'static str,
    locator: Option<SearchLocator>,
}

impl CollectionApi {
    pub fn new(
        handle: ClusterHandle,
        kind: ResourceKind,
        routes: &'static Routes,
        collection: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self {
            handle,
            kind,
            routes,
            collection: collection.into(),
            field,
            locator: None,
        }
    }

    /// Enable locate-by-name through a filtered search.
    pub fn with_locator(mut self, locator: SearchLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    fn path(&self, id: &ResourceIdentity) -> Result<String, ApiError> {
        Ok(format!("{}/{}", self.collection, segment(&id.id)?))
    }
}

impl ResourceApi for CollectionApi {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn dialect(&self) -> Dialect {
        self.routes.dialect
    }

    fn routes(&self) -> &'static Routes {
        self.routes
    }

    fn native_create_dedup(&self) -> bool {
        false
    }

    fn create(
        &self,
        _target: Option<&ResourceIdentity>,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<ResourceIdentity, ApiError> {
        let req = ClusterRequest::new(Method::Post, self.collection.clone()).with_body(body.clone());
        let wire = WireContext::request(req.method.as_str(), req.path.clone());
        let resp = send(&self.handle, req, cancel)?;
        assigned_id(&resp, &wire)
    }

    fn read(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<Value, ApiError> {
        let req = ClusterRequest::new(Method::Get, self.path(id)?);
        let wire = WireContext::request(req.method.as_str(), req.path.clone());
        let resp = send(&self.handle, req, cancel)?;
        Envelope::Field(self.field).open(resp, &id.id, &wire)
    }

    fn update(
        &self,
        id: &ResourceIdentity,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<(), ApiError> {
        send(
            &self.handle,
            ClusterRequest::new(Method::Put, self.path(id)?).with_body(body.clone()),
            cancel,
        )?;
        Ok(())
    }

    fn delete(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<(), ApiError> {
        send(
            &self.handle,
            ClusterRequest::new(Method::Delete, self.path(id)?),
            cancel,
        )?;
        Ok(())
    }

    fn locate_by_name(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Option<ResourceIdentity>, ApiError> {
        match &self.locator {
            Some(locator) => locator.find_by_name(&self.handle, name, cancel),
            None => Ok(None),
        }
    }

    fn can_locate_by_name(&self) -> bool {
        self.locator.is_some()
    }
}

// ---------------------------------------------------------------------------
// SearchLocatedApi
// ---------------------------------------------------------------------------

/// A collection kind whose dialect has no per-id GET: reads go through the
/// locator's `_id` search, writes go to the collection endpoints.
#[derive(Debug)]
pub struct SearchLocatedApi {
    writes: CollectionApi,
    locator: SearchLocator,
}

impl SearchLocatedApi {
    pub fn new(writes: CollectionApi, locator: SearchLocator) -> Self {
        let writes = writes.with_locator(locator.clone());
        Self { writes, locator }
    }
}

impl ResourceApi for SearchLocatedApi {
    fn kind(&self) -> ResourceKind {
        self.writes.kind()
    }

    fn dialect(&self) -> Dialect {
        self.writes.dialect()
    }

    fn routes(&self) -> &'static Routes {
        self.writes.routes()
    }

    fn native_create_dedup(&self) -> bool {
        false
    }

    fn create(
        &self,
        target: Option<&ResourceIdentity>,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<ResourceIdentity, ApiError> {
        self.writes.create(target, body, cancel)
    }

    fn read(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<Value, ApiError> {
        self.locator.find_by_id(&self.writes.handle, id, cancel)
    }

    fn update(
        &self,
        id: &ResourceIdentity,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<(), ApiError> {
        self.writes.update(id, body, cancel)
    }

    fn delete(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<(), ApiError> {
        self.writes.delete(id, cancel)
    }

    fn locate_by_name(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Option<ResourceIdentity>, ApiError> {
        self.locator.find_by_name(&self.writes.handle, name, cancel)
    }

    fn can_locate_by_name(&self) -> bool {
        true
    }
}
