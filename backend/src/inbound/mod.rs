//! Inbound adapters translating external requests into dispatched domain
//! requests. Framework details stay at this edge.

pub mod http;
