//! srk-normalize
//!
//! Diff suppression for cluster configuration documents.
//!
//! A document is canonicalized and flattened into dotted-path → string pairs
//! under a per-kind [`NormalizeProfile`]; two documents are equivalent iff the
//! pair sets are equal. Key order, unordered array order, numeric/string
//! spelling of equal values and server-injected fields never register.
//!
//! It does **not**:
//! - talk to a cluster
//! - know any resource kind (profiles are supplied by the reconcilers)

mod diff;
mod flatten;
mod profile;

pub use diff::{compare, diff_normalized, DiffVerdict, FieldDiff};
pub use flatten::{coerce_scalar, normalize, NormalizedDoc};
pub use profile::NormalizeProfile;
