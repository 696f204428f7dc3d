//! srk-cluster
//!
//! The opaque cluster handle every reconciler talks through.
//!
//! A [`ClusterHandle`] is a dialect tag plus a shared [`Transport`]. The tag is
//! decided once, when the handle is built ([`connect`]), and never changes.
//! The core never inspects the transport's concrete type.
//!
//! It does **not**:
//! - retry, back off, or cache
//! - interpret status codes (that is the dialect layer's classifier)

mod handle;
pub mod http;
mod probe;
mod transport;

pub use handle::ClusterHandle;
pub use http::HttpTransport;
pub use probe::{connect, detect_dialect};
pub use transport::{CancelToken, ClusterRequest, Method, RawResponse, Transport, TransportError};
