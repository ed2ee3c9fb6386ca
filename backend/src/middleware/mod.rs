//! Request middleware.
//!
//! Cross-cutting concerns applied to every HTTP request before it reaches a
//! route handler.

pub mod trace;

pub use trace::Trace;
