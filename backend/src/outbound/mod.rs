//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: in-memory and PostgreSQL row stores, user directory
//! - **messaging**: notification publishers
//!
//! Adapters translate between domain types and infrastructure shapes and
//! hold no business rules.

pub mod messaging;
pub mod persistence;
