use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use srk_cluster::CancelToken;
use srk_schemas::{Dialect, ResourceIdentity, ResourceKind, WireContext};

use crate::classify::ApiError;
use crate::routes::Routes;

// ---------------------------------------------------------------------------
// ResourceApi
// ---------------------------------------------------------------------------

/// CRUD for one kind on one dialect.
///
/// Produced once by [`crate::select`]; callers hold the trait object and never
/// look at the dialect again to decide which call to make.
pub trait ResourceApi: Send + Sync + fmt::Debug {
    fn kind(&self) -> ResourceKind;

    fn dialect(&self) -> Dialect;

    fn routes(&self) -> &'static Routes;

    /// `true` when the create call itself refuses to overwrite an existing
    /// object, so no existence check is needed first.
    fn native_create_dedup(&self) -> bool;

    /// Fill in dialect defaults (index, mapping type) on a caller identity.
    fn canonical_identity(&self, target: &ResourceIdentity) -> Result<ResourceIdentity, ApiError> {
        Ok(target.clone())
    }

    /// Create the object. Caller-named kinds require `target`; server-assigned
    /// kinds ignore it and return the id the cluster assigned.
    fn create(
        &self,
        target: Option<&ResourceIdentity>,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<ResourceIdentity, ApiError>;

    /// The object body, unwrapped from its response envelope.
    fn read(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<Value, ApiError>;

    /// Full-document replace.
    fn update(&self, id: &ResourceIdentity, body: &Value, cancel: &CancelToken)
        -> Result<(), ApiError>;

    fn delete(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<(), ApiError>;

    /// Find an existing object of a server-assigned kind by its name field.
    fn locate_by_name(
        &self,
        _name: &str,
        _cancel: &CancelToken,
    ) -> Result<Option<ResourceIdentity>, ApiError> {
        Ok(None)
    }

    fn can_locate_by_name(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

/// Where the object body sits in a read response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{ "<name>": body }`. A missing key means the object is absent.
    Keyed,
    /// `{ "<field>": body, "_id": .., ... }`.
    Field(&'static str),
    /// Document GET: `{ "found": true, "_source": body }`.
    Source,
}

impl Envelope {
    pub fn open(&self, mut body: Value, name: &str, wire: &WireContext) -> Result<Value, ApiError> {
        match self {
            Envelope::Keyed => match body.as_object_mut().and_then(|m| m.remove(name)) {
                Some(inner) => Ok(inner),
                None => Err(ApiError::not_found(
                    format!("response has no entry for '{name}'"),
                    wire.clone(),
                )),
            },
            Envelope::Field(field) => match body.as_object_mut().and_then(|m| m.remove(*field)) {
                Some(inner) => Ok(inner),
                None => Err(ApiError::fatal(
                    format!("response has no '{field}' field"),
                    wire.clone(),
                )),
            },
            Envelope::Source => {
                if body.get("found") == Some(&Value::Bool(false)) {
                    return Err(ApiError::not_found("document not found", wire.clone()));
                }
                match body.as_object_mut().and_then(|m| m.remove("_source")) {
                    Some(inner) => Ok(inner),
                    None => Err(ApiError::fatal("response has no '_source'", wire.clone())),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Path segments
// ---------------------------------------------------------------------------

/// Everything but RFC 3986 unreserved characters, plus `:` and `@` which
/// saved-object ids use.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':')
    .remove(b'@');

/// One identity component, escaped so it stays a single path segment.
///
/// Names the cluster would expand to several objects (wildcards, comma
/// lists) or resolve relative to the parent are refused before any call.
pub(crate) fn segment(raw: &str) -> Result<String, ApiError> {
    if raw.is_empty() || raw == "." || raw == ".." || raw.contains(|c: char| c == '*' || c == ',') {
        return Err(ApiError::fatal(
            format!("'{raw}' cannot name a single object"),
            WireContext::default(),
        ));
    }
    Ok(utf8_percent_encode(raw, SEGMENT).to_string())
}

/// Pull the server-assigned `_id` out of a create response.
pub(crate) fn assigned_id(resp: &Value, wire: &WireContext) -> Result<ResourceIdentity, ApiError> {
    match resp.get("_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(ResourceIdentity::named(id)),
        _ => Err(ApiError::fatal("create response carried no _id", wire.clone())),
    }
}
