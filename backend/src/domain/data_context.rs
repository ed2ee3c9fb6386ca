//! Typed persistence access for handlers.
//!
//! A [`DataContext`] wraps a [`RowStore`] and a clock. Reads decode rows into
//! [`Record`] values and hide soft-deleted rows. Writes are collected in a
//! [`UnitOfWork`] and applied by [`DataContext::commit`], which is the only
//! path to the store and always runs the audit stamp first.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::audit::{ChangeKind, ChangeSet, stamp};
use super::context::{Cancelled, cancellable};
use super::entity::{EntityBody, Record, RowCodecError, StoredRow, Table};
use super::ports::{RowFilter, RowStore, RowStoreError};
use super::query::AuthScope;

/// Default number of attempts for a commit hitting connection failures.
pub const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;

/// Failures surfaced by the data context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("no live {table} row with id {id}")]
    NotFound { table: Table, id: Uuid },
    #[error(transparent)]
    Store(RowStoreError),
    #[error(transparent)]
    Codec(#[from] RowCodecError),
}

impl From<RowStoreError> for DataError {
    fn from(err: RowStoreError) -> Self {
        match err {
            RowStoreError::Missing { table, id } => Self::NotFound { table, id },
            other => Self::Store(other),
        }
    }
}

/// Changes a handler wants applied in its single commit.
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    changes: ChangeSet,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a new row.
    ///
    /// # Errors
    /// Fails when the record cannot be encoded.
    pub fn add<B: EntityBody>(&mut self, record: &Record<B>) -> Result<(), RowCodecError> {
        self.push(ChangeKind::Added, record)
    }

    /// Queue an update of an existing row.
    ///
    /// # Errors
    /// Fails when the record cannot be encoded.
    pub fn modify<B: EntityBody>(&mut self, record: &Record<B>) -> Result<(), RowCodecError> {
        self.push(ChangeKind::Modified, record)
    }

    /// Queue a removal. The audit stamp turns it into a soft delete.
    ///
    /// # Errors
    /// Fails when the record cannot be encoded.
    pub fn remove<B: EntityBody>(&mut self, record: &Record<B>) -> Result<(), RowCodecError> {
        self.push(ChangeKind::Removed, record)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn push<B: EntityBody>(
        &mut self,
        kind: ChangeKind,
        record: &Record<B>,
    ) -> Result<(), RowCodecError> {
        self.changes.push(kind, record.to_row()?);
        Ok(())
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReceipt {
    rows_affected: usize,
    rows: Vec<StoredRow>,
}

impl CommitReceipt {
    pub fn rows_affected(&self) -> usize {
        self.rows_affected
    }

    /// The stamped image of a committed row.
    ///
    /// # Errors
    /// Returns [`DataError::NotFound`] when the commit did not include the
    /// row, or a codec error when it cannot be decoded as `B`.
    pub fn record<B: EntityBody>(&self, id: Uuid) -> Result<Record<B>, DataError> {
        let row = self
            .rows
            .iter()
            .find(|row| row.table == B::TABLE && row.audit.id() == id)
            .cloned()
            .ok_or(DataError::NotFound {
                table: B::TABLE,
                id,
            })?;
        Ok(Record::from_row(row)?)
    }
}

/// Store-side part of `scope` for `B`.
fn row_filter<B: EntityBody>(scope: &AuthScope) -> RowFilter {
    RowFilter {
        auth_user_id: scope.user_id.filter(|_| B::OWNER_COLUMNS.user),
        auth_customer_id: scope.customer_id.filter(|_| B::OWNER_COLUMNS.customer),
    }
}

/// Persistence facade handed to handlers.
#[derive(Clone)]
pub struct DataContext {
    store: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
    commit_attempts: u32,
}

impl DataContext {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            commit_attempts: DEFAULT_COMMIT_ATTEMPTS,
        }
    }

    /// Bound the attempts made for a commit failing with connection errors.
    /// Values below one are treated as one.
    #[must_use]
    pub fn with_commit_attempts(mut self, attempts: u32) -> Self {
        self.commit_attempts = attempts.max(1);
        self
    }

    /// Load a live row.
    ///
    /// # Errors
    /// Fails on cancellation, store errors or undecodable rows.
    pub async fn find<B: EntityBody>(
        &self,
        id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Option<Record<B>>, DataError> {
        let row = cancellable(cancel, self.store.find_row(B::TABLE, id)).await??;
        match row {
            Some(row) if row.audit.is_live() => Ok(Some(Record::from_row(row)?)),
            Some(_) | None => Ok(None),
        }
    }

    /// Load the live rows of `B`'s table, oldest first.
    ///
    /// The parts of `scope` that `B` backs with attribution columns are
    /// handed to the store as a [`RowFilter`]. Callers still apply the full
    /// scope to the result.
    ///
    /// # Errors
    /// Fails on cancellation, store errors or undecodable rows.
    pub async fn list<B: EntityBody>(
        &self,
        scope: &AuthScope,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record<B>>, DataError> {
        let filter = row_filter::<B>(scope);
        let rows = cancellable(cancel, self.store.list_rows(B::TABLE, &filter)).await??;
        let mut records = rows
            .into_iter()
            .filter(|row| row.audit.is_live())
            .map(Record::from_row)
            .collect::<Result<Vec<Record<B>>, _>>()?;
        records.sort_by_key(|record| (record.audit().row_created_date(), record.id()));
        Ok(records)
    }

    /// Stamp and apply `work` as one atomic batch.
    ///
    /// The clock is read once. Connection failures are retried with the same
    /// stamped batch up to the configured attempt count.
    ///
    /// Cancellation is checked before each attempt. Once a write is in
    /// flight it runs to completion, so a commit that reached the store is
    /// never reported as cancelled.
    ///
    /// # Errors
    /// Fails on cancellation before a write starts, when an update target is
    /// no longer live, or when the store rejects the batch.
    pub async fn commit(
        &self,
        work: UnitOfWork,
        cancel: &CancellationToken,
    ) -> Result<CommitReceipt, DataError> {
        if work.is_empty() {
            return Ok(CommitReceipt::default());
        }
        let batch = stamp(work.changes, self.clock.utc());
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled.into());
            }
            match self.store.write_batch(&batch).await {
                Ok(rows_affected) => {
                    debug!(rows_affected, attempt, "commit applied");
                    return Ok(CommitReceipt {
                        rows_affected,
                        rows: batch.rows().cloned().collect(),
                    });
                }
                Err(err) if err.is_transient() && attempt < self.commit_attempts => {
                    warn!(error = %err, attempt, "commit failed; retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Commit pipeline coverage against a mocked store.
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::audit::{Attribution, AuditFields, StampedChangeSet};
    use crate::domain::entities::{Category, JobPosting, Review};
    use crate::domain::ports::MockRowStore;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn context(store: MockRowStore, now: DateTime<Utc>) -> DataContext {
        DataContext::new(Arc::new(store), Arc::new(FixedClock(now)))
    }

    fn category() -> Record<Category> {
        Record::new(
            Uuid::new_v4(),
            Category {
                name: "Florists".to_owned(),
                slug: "florists".to_owned(),
                description: None,
            },
        )
    }

    fn stored(record: &Record<Category>, live: bool) -> StoredRow {
        let mut row = record.to_row().expect("encode");
        row.audit = AuditFields::restore(
            record.id(),
            Attribution::default(),
            DateTime::<Utc>::default(),
            DateTime::<Utc>::default(),
            live,
            !live,
        );
        row
    }

    #[rstest]
    #[tokio::test]
    async fn commit_stamps_with_the_clock(now: DateTime<Utc>) {
        let mut store = MockRowStore::new();
        store
            .expect_write_batch()
            .times(1)
            .returning(|batch| Ok(batch.changes().len()));
        let record = category();
        let mut work = UnitOfWork::new();
        work.add(&record).expect("encode");

        let receipt = context(store, now)
            .commit(work, &CancellationToken::new())
            .await
            .expect("commit");
        let saved = receipt.record::<Category>(record.id()).expect("saved row");
        assert_eq!(receipt.rows_affected(), 1);
        assert_eq!(saved.audit().row_created_date(), now);
        assert!(saved.audit().is_live());
    }

    #[rstest]
    #[tokio::test]
    async fn retries_reuse_the_same_stamps(now: DateTime<Utc>) {
        let seen: Arc<Mutex<Vec<StampedChangeSet>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let mut store = MockRowStore::new();
        store.expect_write_batch().times(2).returning(move |batch| {
            let mut calls = recorder.lock().expect("recorder lock");
            calls.push(batch.clone());
            if calls.len() == 1 {
                Err(RowStoreError::connection("reset by peer"))
            } else {
                Ok(1)
            }
        });
        let mut work = UnitOfWork::new();
        work.add(&category()).expect("encode");

        context(store, now)
            .commit(work, &CancellationToken::new())
            .await
            .expect("second attempt succeeds");
        let calls = seen.lock().expect("recorder lock");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.first(), calls.last());
    }

    #[rstest]
    #[tokio::test]
    async fn query_errors_are_not_retried(now: DateTime<Utc>) {
        let mut store = MockRowStore::new();
        store
            .expect_write_batch()
            .times(1)
            .returning(|_| Err(RowStoreError::query("constraint violated")));
        let mut work = UnitOfWork::new();
        work.add(&category()).expect("encode");

        let err = context(store, now)
            .commit(work, &CancellationToken::new())
            .await
            .expect_err("store failure");
        assert_eq!(err, DataError::Store(RowStoreError::query("constraint violated")));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_targets_become_not_found(now: DateTime<Utc>) {
        let record = category();
        let id = record.id();
        let mut store = MockRowStore::new();
        store
            .expect_write_batch()
            .returning(move |_| Err(RowStoreError::missing(Table::Categories, id)));
        let mut work = UnitOfWork::new();
        work.remove(&record).expect("encode");

        let err = context(store, now)
            .commit(work, &CancellationToken::new())
            .await
            .expect_err("already deleted");
        assert_eq!(err, DataError::NotFound { table: Table::Categories, id });
    }

    #[rstest]
    #[tokio::test]
    async fn cancelled_commits_never_reach_the_store(now: DateTime<Utc>) {
        let mut store = MockRowStore::new();
        store.expect_write_batch().times(0);
        let mut work = UnitOfWork::new();
        work.add(&category()).expect("encode");
        let token = CancellationToken::new();
        token.cancel();

        let err = context(store, now).commit(work, &token).await.expect_err("cancelled");
        assert_eq!(err, DataError::Cancelled(Cancelled));
    }

    #[rstest]
    #[tokio::test]
    async fn find_hides_soft_deleted_rows(now: DateTime<Utc>) {
        let record = category();
        let row = stored(&record, false);
        let mut store = MockRowStore::new();
        store
            .expect_find_row()
            .returning(move |_, _| Ok(Some(row.clone())));

        let found = context(store, now)
            .find::<Category>(record.id(), &CancellationToken::new())
            .await
            .expect("find");
        assert!(found.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn list_skips_deleted_rows(now: DateTime<Utc>) {
        let live = category();
        let gone = category();
        let rows = vec![stored(&live, true), stored(&gone, false)];
        let mut store = MockRowStore::new();
        store
            .expect_list_rows()
            .returning(move |_, _| Ok(rows.clone()));

        let listed = context(store, now)
            .list::<Category>(&AuthScope::unrestricted(), &CancellationToken::new())
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().map(Record::id), Some(live.id()));
    }

    #[rstest]
    #[case::unscoped_table_ignores_the_caller(Table::Categories, RowFilter::unrestricted())]
    #[case::user_column_only(
        Table::Reviews,
        RowFilter { auth_user_id: Some(Uuid::from_u128(1)), auth_customer_id: None }
    )]
    #[case::customer_column_only(
        Table::JobPostings,
        RowFilter { auth_user_id: None, auth_customer_id: Some(Uuid::from_u128(2)) }
    )]
    #[tokio::test]
    async fn list_pushes_backed_owner_columns_to_the_store(
        now: DateTime<Utc>,
        #[case] table: Table,
        #[case] expected: RowFilter,
    ) {
        let scope = AuthScope {
            user_id: Some(Uuid::from_u128(1)),
            customer_id: Some(Uuid::from_u128(2)),
        };
        let mut store = MockRowStore::new();
        store
            .expect_list_rows()
            .withf(move |listed, filter| *listed == table && *filter == expected)
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        let data = context(store, now);
        let cancel = CancellationToken::new();

        match table {
            Table::Categories => data.list::<Category>(&scope, &cancel).await.map(|_| ()),
            Table::Reviews => data.list::<Review>(&scope, &cancel).await.map(|_| ()),
            _ => data.list::<JobPosting>(&scope, &cancel).await.map(|_| ()),
        }
        .expect("list");
    }

    /// Store whose write cancels the request before it finishes.
    struct CancelsDuringWrite {
        token: CancellationToken,
        outcome: Result<usize, RowStoreError>,
        writes: AtomicUsize,
    }

    impl CancelsDuringWrite {
        fn new(token: &CancellationToken, outcome: Result<usize, RowStoreError>) -> Self {
            Self {
                token: token.clone(),
                outcome,
                writes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RowStore for CancelsDuringWrite {
        async fn find_row(
            &self,
            _table: Table,
            _id: Uuid,
        ) -> Result<Option<StoredRow>, RowStoreError> {
            Ok(None)
        }

        async fn list_rows(
            &self,
            _table: Table,
            _filter: &RowFilter,
        ) -> Result<Vec<StoredRow>, RowStoreError> {
            Ok(Vec::new())
        }

        async fn write_batch(&self, _batch: &StampedChangeSet) -> Result<usize, RowStoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.token.cancel();
            tokio::task::yield_now().await;
            self.outcome.clone()
        }
    }

    #[rstest]
    #[tokio::test]
    async fn a_write_in_flight_is_reported_even_if_cancelled(now: DateTime<Utc>) {
        let token = CancellationToken::new();
        let store = Arc::new(CancelsDuringWrite::new(&token, Ok(1)));
        let data = DataContext::new(store.clone(), Arc::new(FixedClock(now)));
        let record = category();
        let mut work = UnitOfWork::new();
        work.add(&record).expect("encode");

        let receipt = data.commit(work, &token).await.expect("commit reached the store");
        assert_eq!(receipt.rows_affected(), 1);
        assert!(token.is_cancelled());
    }

    #[rstest]
    #[tokio::test]
    async fn cancellation_stops_further_retries(now: DateTime<Utc>) {
        let token = CancellationToken::new();
        let store = Arc::new(CancelsDuringWrite::new(
            &token,
            Err(RowStoreError::connection("reset by peer")),
        ));
        let data = DataContext::new(store.clone(), Arc::new(FixedClock(now)));
        let mut work = UnitOfWork::new();
        work.add(&category()).expect("encode");

        let err = data.commit(work, &token).await.expect_err("cancelled");
        assert_eq!(err, DataError::Cancelled(Cancelled));
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }
}
