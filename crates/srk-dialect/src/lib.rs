//! srk-dialect
//!
//! Per-dialect CRUD shims and the error classifier.
//!
//! [`select`] reads the handle's dialect tag exactly once and returns a
//! [`ResourceApi`] trait object for the requested kind. Everything above this
//! crate is written against that trait; nothing above it matches on
//! [`srk_schemas::Dialect`] to pick a request.
//!
//! Four request shapes cover every kind:
//! - [`NamedApi`]: `{base}/{name}` with a caller-chosen name
//! - [`CollectionApi`]: collection POST, server-assigned `_id`
//! - [`SearchLocatedApi`]: like a collection, but read by filtered search
//! - [`DocumentApi`]: `/{index}/{type}/{id}` documents
//!
//! It does **not**:
//! - retry (transient failures are classified and returned)
//! - normalize or compare bodies (that is `srk-normalize`)

mod api;
pub mod classify;
mod collection;
mod document;
mod named;
mod routes;
mod selector;

pub use api::{Envelope, ResourceApi};
pub use classify::{check_status, classify_status, ApiError};
pub use collection::{CollectionApi, SearchLocatedApi, SearchLocator};
pub use document::DocumentApi;
pub use named::NamedApi;
pub use routes::{Routes, V5_ROUTES, V6_ROUTES, V7_ROUTES};
pub use selector::{select, supports};
