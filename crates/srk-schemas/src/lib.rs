//! srk-schemas
//!
//! Shared vocabulary for every srk crate: API dialects, managed resource kinds,
//! resource identities and the error taxonomy reconcilers report to the host.
//!
//! Pure types. No IO.

mod dialect;
mod error;
mod identity;
mod kind;

pub use dialect::{Dialect, DialectParseError};
pub use error::{ErrorKind, Operation, ReconcileError, WireContext, BODY_EXCERPT_LIMIT};
pub use identity::{IdentityParseError, ResourceIdentity};
pub use kind::{IdentitySource, KindParseError, ResourceKind};
