//! Port for table-agnostic row persistence.
//!
//! Handlers never call a store directly; the data context reads through
//! [`RowStore::find_row`] and [`RowStore::list_rows`] and writes exactly one
//! stamped batch per commit through [`RowStore::write_batch`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::audit::StampedChangeSet;
use crate::domain::entity::{StoredRow, Table};

use super::define_port_error;

define_port_error! {
    /// Errors raised by row store adapters.
    pub enum RowStoreError {
        /// The store could not be reached. Commits may retry these.
        Connection { message: String } => "row store connection failed: {message}",
        /// A query or write failed during execution.
        Query { message: String } => "row store query failed: {message}",
        /// An update targeted a row that is absent or no longer live.
        Missing { table: Table, id: Uuid } => "no live {table} row with id {id}",
    }
}

impl RowStoreError {
    /// Whether a commit may be attempted again with the same batch.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Attribution constraints a store applies while listing.
///
/// Each field matches the row's `authUserId` or `authCustomerId` column;
/// `None` disables that constraint. Rows whose column is null never match an
/// enabled constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub auth_user_id: Option<Uuid>,
    pub auth_customer_id: Option<Uuid>,
}

impl RowFilter {
    /// Filter that keeps every live row.
    pub const fn unrestricted() -> Self {
        Self {
            auth_user_id: None,
            auth_customer_id: None,
        }
    }

    /// Whether `row` satisfies every enabled constraint.
    pub fn admits(&self, row: &StoredRow) -> bool {
        let attribution = row.audit.attribution();
        let user_ok = self
            .auth_user_id
            .is_none_or(|wanted| attribution.auth_user_id == Some(wanted));
        let customer_ok = self
            .auth_customer_id
            .is_none_or(|wanted| attribution.auth_customer_id == Some(wanted));
        user_ok && customer_ok
    }
}

/// Persistence capability shared by every guide table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Load one row by id, including soft-deleted rows.
    async fn find_row(&self, table: Table, id: Uuid) -> Result<Option<StoredRow>, RowStoreError>;

    /// Load the live rows of a table that satisfy `filter`.
    async fn list_rows(
        &self,
        table: Table,
        filter: &RowFilter,
    ) -> Result<Vec<StoredRow>, RowStoreError>;

    /// Apply a stamped batch atomically and return the number of rows written.
    ///
    /// Updates only apply to live rows. If any update finds its target absent
    /// or deleted the whole batch is rejected with
    /// [`RowStoreError::Missing`].
    async fn write_batch(&self, batch: &StampedChangeSet) -> Result<usize, RowStoreError>;
}
