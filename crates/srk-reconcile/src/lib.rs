//! srk-reconcile
//!
//! Resource reconcilers: one [`Reconciler`] per (cluster, kind).
//!
//! State machine per object:
//! `Absent → create → Present → update* → Present → delete → Absent`;
//! `import` goes `Absent → Present` by trusting an identity and reading it.
//!
//! Architectural decisions:
//! - The dialect implementation is chosen once, at construction
//! - Exactly one attempt per call; at most two round-trips (existence check + write)
//! - Create never overwrites: a prior Read (or name lookup) guards kinds without server-side dedup
//! - NotFound clears the identity; Unsupported and Cancelled are distinct from Fatal
//!
//! It does **not**:
//! - retry, back off, or cache
//! - order work across objects (that is the host's job)

mod kinds;
mod reconciler;
mod types;

pub use kinds::{profile_for, KindProfile, STATIC_INDEX_SETTINGS};
pub use reconciler::Reconciler;
pub use types::*;
