//! HTTP inbound adapter.

pub mod entities;
pub mod error;
pub mod health;
pub mod identity;
pub mod state;

pub use entities::api_scope;
pub use error::{ApiResult, HttpError};
