//! PostgreSQL row store over the single `guide_rows` table.
//!
//! A stamped batch runs inside one transaction. Updates are guarded by the
//! live-row predicate; an update that matches nothing aborts the transaction
//! and reports [`RowStoreError::Missing`], which is how a second concurrent
//! delete of the same row is detected.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use super::diesel_basic_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{GuideRowChanges, GuideRowRecord};
use super::pool::{DbPool, PoolError};
use super::schema::guide_rows;
use crate::domain::audit::{StampedChangeSet, WriteOp};
use crate::domain::entity::{StoredRow, Table};
use crate::domain::ports::{RowFilter, RowStore, RowStoreError};

/// Diesel-backed implementation of [`RowStore`].
#[derive(Clone)]
pub struct DieselRowStore {
    pool: DbPool,
}

impl DieselRowStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RowStoreError {
    map_pool_error(error, RowStoreError::connection)
}

fn diesel_error(error: diesel::result::Error) -> RowStoreError {
    map_diesel_error(error, RowStoreError::query, RowStoreError::connection)
}

fn decode(record: GuideRowRecord) -> Result<StoredRow, RowStoreError> {
    StoredRow::try_from(record).map_err(|err| RowStoreError::query(err.to_string()))
}

/// Failure inside the batch transaction.
enum BatchError {
    Diesel(diesel::result::Error),
    Missing { table: Table, id: Uuid },
}

impl From<diesel::result::Error> for BatchError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

/// Owned write prepared outside the transaction.
enum PreparedWrite {
    Insert(GuideRowRecord),
    Update {
        table: Table,
        id: Uuid,
        changes: GuideRowChanges,
    },
}

fn prepare(batch: &StampedChangeSet) -> Vec<PreparedWrite> {
    batch
        .changes()
        .iter()
        .map(|change| match change.op() {
            WriteOp::Insert => PreparedWrite::Insert(GuideRowRecord::from(change.row())),
            WriteOp::Update => PreparedWrite::Update {
                table: change.table(),
                id: change.id(),
                changes: GuideRowChanges::from(change.row()),
            },
        })
        .collect()
}

#[async_trait]
impl RowStore for DieselRowStore {
    async fn find_row(&self, table: Table, id: Uuid) -> Result<Option<StoredRow>, RowStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        guide_rows::table
            .filter(guide_rows::table_name.eq(table.as_str()))
            .filter(guide_rows::id.eq(id))
            .select(GuideRowRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(decode)
            .transpose()
    }

    async fn list_rows(
        &self,
        table: Table,
        filter: &RowFilter,
    ) -> Result<Vec<StoredRow>, RowStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = guide_rows::table
            .filter(guide_rows::table_name.eq(table.as_str()))
            .filter(guide_rows::row_is_active.eq(true))
            .filter(guide_rows::row_is_deleted.eq(false))
            .order((guide_rows::row_created_date.asc(), guide_rows::id.asc()))
            .select(GuideRowRecord::as_select())
            .into_boxed();

        if let Some(user) = filter.auth_user_id {
            query = query.filter(guide_rows::auth_user_id.eq(user));
        }
        if let Some(customer) = filter.auth_customer_id {
            query = query.filter(guide_rows::auth_customer_id.eq(customer));
        }

        let records: Vec<GuideRowRecord> = query.load(&mut conn).await.map_err(diesel_error)?;
        records.into_iter().map(decode).collect()
    }

    async fn write_batch(&self, batch: &StampedChangeSet) -> Result<usize, RowStoreError> {
        let writes = prepare(batch);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let written = conn
            .transaction::<usize, BatchError, _>(|conn| {
                async move {
                    let mut written = 0;
                    for write in &writes {
                        match write {
                            PreparedWrite::Insert(record) => {
                                written += diesel::insert_into(guide_rows::table)
                                    .values(record)
                                    .execute(conn)
                                    .await?;
                            }
                            PreparedWrite::Update { table, id, changes } => {
                                let updated = diesel::update(
                                    guide_rows::table
                                        .filter(guide_rows::table_name.eq(table.as_str()))
                                        .filter(guide_rows::id.eq(*id))
                                        .filter(guide_rows::row_is_active.eq(true))
                                        .filter(guide_rows::row_is_deleted.eq(false)),
                                )
                                .set(changes)
                                .execute(conn)
                                .await?;
                                if updated == 0 {
                                    return Err(BatchError::Missing {
                                        table: *table,
                                        id: *id,
                                    });
                                }
                                written += updated;
                            }
                        }
                    }
                    Ok(written)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| match err {
                BatchError::Diesel(error) => diesel_error(error),
                BatchError::Missing { table, id } => RowStoreError::missing(table, id),
            })?;

        debug!(written, stamped_at = %batch.stamped_at(), "guide rows committed");
        Ok(written)
    }
}
