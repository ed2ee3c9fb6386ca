//! Guide backend library.
//!
//! The [`domain`] core is transport-agnostic: typed requests are routed by
//! the [`domain::Dispatcher`] to generic entity handlers that read through
//! the [`domain::DataContext`] and commit audited change sets. Adapters live
//! in [`inbound`] (HTTP) and [`outbound`] (persistence, messaging).

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::trace_id::TraceId;
pub use middleware::trace::Trace;
