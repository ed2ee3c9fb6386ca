//! Process-local row store.
//!
//! Used when no database URL is configured and by the behavioural tests.
//! A batch is validated in full under the write lock before any row changes,
//! so a rejected batch leaves the store untouched.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::audit::{StampedChangeSet, WriteOp};
use crate::domain::entity::{StoredRow, Table};
use crate::domain::ports::{RowFilter, RowStore, RowStoreError};

/// Row store keeping every table in one ordered map.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    rows: RwLock<BTreeMap<(Table, Uuid), StoredRow>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows in `table`, soft-deleted ones included.
    pub async fn stored_count(&self, table: Table) -> usize {
        self.rows
            .read()
            .await
            .keys()
            .filter(|(row_table, _)| *row_table == table)
            .count()
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn find_row(&self, table: Table, id: Uuid) -> Result<Option<StoredRow>, RowStoreError> {
        Ok(self.rows.read().await.get(&(table, id)).cloned())
    }

    async fn list_rows(
        &self,
        table: Table,
        filter: &RowFilter,
    ) -> Result<Vec<StoredRow>, RowStoreError> {
        Ok(self
            .rows
            .read()
            .await
            .range((table, Uuid::nil())..=(table, Uuid::from_u128(u128::MAX)))
            .map(|(_, row)| row)
            .filter(|row| row.audit.is_live() && filter.admits(row))
            .cloned()
            .collect())
    }

    async fn write_batch(&self, batch: &StampedChangeSet) -> Result<usize, RowStoreError> {
        let mut rows = self.rows.write().await;
        for change in batch.changes() {
            let key = (change.table(), change.id());
            match (change.op(), rows.get(&key)) {
                (WriteOp::Insert, Some(_)) => {
                    return Err(RowStoreError::query(format!(
                        "duplicate {} id {}",
                        change.table(),
                        change.id()
                    )));
                }
                (WriteOp::Update, Some(existing)) if existing.audit.is_live() => {}
                (WriteOp::Update, _) => {
                    return Err(RowStoreError::missing(change.table(), change.id()));
                }
                (WriteOp::Insert, None) => {}
            }
        }
        for change in batch.changes() {
            rows.insert((change.table(), change.id()), change.row().clone());
        }
        debug!(rows = batch.changes().len(), "memory batch applied");
        Ok(batch.changes().len())
    }
}
