//! Row store and user directory adapters.
//!
//! [`MemoryRowStore`] keeps rows in process. The Diesel adapters use
//! PostgreSQL through `diesel-async` and a `bb8` pool; their row structs and
//! schema stay private to this module.

mod diesel_basic_error_mapping;
mod diesel_row_store;
mod diesel_user_directory;
mod memory_row_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_row_store::DieselRowStore;
pub use diesel_user_directory::DieselUserDirectory;
pub use memory_row_store::MemoryRowStore;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
