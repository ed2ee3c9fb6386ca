//! Row store doubles.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::audit::StampedChangeSet;
use crate::domain::entity::{StoredRow, Table};
use crate::domain::ports::{RowFilter, RowStore, RowStoreError};
use crate::outbound::persistence::MemoryRowStore;

/// Memory store whose first writes fail with a transient error.
pub struct FlakyRowStore {
    inner: MemoryRowStore,
    failures_left: AtomicU32,
    attempts: Mutex<Vec<StampedChangeSet>>,
}

impl FlakyRowStore {
    pub fn failing_first(failures: u32) -> Self {
        Self {
            inner: MemoryRowStore::new(),
            failures_left: AtomicU32::new(failures),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Every batch handed to `write_batch`, in call order.
    pub fn attempts(&self) -> Vec<StampedChangeSet> {
        match self.attempts.lock() {
            Ok(attempts) => attempts.clone(),
            Err(_) => panic!("attempts mutex"),
        }
    }

    pub fn inner(&self) -> &MemoryRowStore {
        &self.inner
    }
}

#[async_trait]
impl RowStore for FlakyRowStore {
    async fn find_row(&self, table: Table, id: Uuid) -> Result<Option<StoredRow>, RowStoreError> {
        self.inner.find_row(table, id).await
    }

    async fn list_rows(
        &self,
        table: Table,
        filter: &RowFilter,
    ) -> Result<Vec<StoredRow>, RowStoreError> {
        self.inner.list_rows(table, filter).await
    }

    async fn write_batch(&self, batch: &StampedChangeSet) -> Result<usize, RowStoreError> {
        match self.attempts.lock() {
            Ok(mut attempts) => attempts.push(batch.clone()),
            Err(_) => panic!("attempts mutex"),
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(RowStoreError::connection("connection reset by peer"));
        }
        self.inner.write_batch(batch).await
    }
}

/// Store whose calls never complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct StallingRowStore;

#[async_trait]
impl RowStore for StallingRowStore {
    async fn find_row(&self, _table: Table, _id: Uuid) -> Result<Option<StoredRow>, RowStoreError> {
        std::future::pending().await
    }

    async fn list_rows(
        &self,
        _table: Table,
        _filter: &RowFilter,
    ) -> Result<Vec<StoredRow>, RowStoreError> {
        std::future::pending().await
    }

    async fn write_batch(&self, _batch: &StampedChangeSet) -> Result<usize, RowStoreError> {
        std::future::pending().await
    }
}
