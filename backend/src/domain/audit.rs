//! Audit columns and the pre-commit stamping stage.
//!
//! Handlers describe what they want persisted as a [`ChangeSet`]. The data
//! context runs [`stamp`] over it exactly once per commit with a single `now`,
//! producing a [`StampedChangeSet`]. Store adapters only accept the stamped
//! form, and nothing outside this module can build one, so timestamps and
//! soft-delete flags are always owned by the interceptor.
//!
//! Deletion is logical everywhere: a removal becomes an update that clears
//! `rowIsActive` and sets `rowIsDeleted`. No store write operation removes a
//! row physically.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::entity::{StoredRow, Table};

/// Who created, last changed, and owns a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub create_user_id: Option<Uuid>,
    pub update_user_id: Option<Uuid>,
    pub auth_user_id: Option<Uuid>,
    pub auth_customer_id: Option<Uuid>,
}

/// Columns shared by every persisted row.
///
/// ## Invariants
/// - `id` never changes after construction.
/// - Timestamps and the active/deleted flags are only written by [`stamp`]
///   or restored from storage through [`AuditFields::restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    id: Uuid,
    #[serde(flatten)]
    attribution: Attribution,
    row_created_date: DateTime<Utc>,
    row_updated_date: DateTime<Utc>,
    row_is_active: bool,
    row_is_deleted: bool,
}

impl AuditFields {
    /// Fresh, unstamped columns for a new row.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            attribution: Attribution::default(),
            row_created_date: DateTime::<Utc>::default(),
            row_updated_date: DateTime::<Utc>::default(),
            row_is_active: false,
            row_is_deleted: false,
        }
    }

    /// Rebuild columns read back from a store.
    pub fn restore(
        id: Uuid,
        attribution: Attribution,
        row_created_date: DateTime<Utc>,
        row_updated_date: DateTime<Utc>,
        row_is_active: bool,
        row_is_deleted: bool,
    ) -> Self {
        Self {
            id,
            attribution,
            row_created_date,
            row_updated_date,
            row_is_active,
            row_is_deleted,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn attribution(&self) -> &Attribution {
        &self.attribution
    }

    pub(crate) fn attribution_mut(&mut self) -> &mut Attribution {
        &mut self.attribution
    }

    pub fn row_created_date(&self) -> DateTime<Utc> {
        self.row_created_date
    }

    pub fn row_updated_date(&self) -> DateTime<Utc> {
        self.row_updated_date
    }

    pub fn row_is_active(&self) -> bool {
        self.row_is_active
    }

    pub fn row_is_deleted(&self) -> bool {
        self.row_is_deleted
    }

    /// A row is live iff it is active and not deleted.
    pub fn is_live(&self) -> bool {
        self.row_is_active && !self.row_is_deleted
    }
}

/// What a handler intends to do with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One intended change, before stamping.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub kind: ChangeKind,
    pub row: StoredRow,
}

/// Changes collected for a single commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<PendingChange>,
}

impl ChangeSet {
    pub fn push(&mut self, kind: ChangeKind, row: StoredRow) {
        self.changes.push(PendingChange { kind, row });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[PendingChange] {
        &self.changes
    }
}

/// Physical write a store adapter performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update,
}

/// Audit column the interceptor marked as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuditColumn {
    RowCreatedDate,
    RowUpdatedDate,
    RowIsActive,
    RowIsDeleted,
}

/// A change after stamping.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedChange {
    op: WriteOp,
    row: StoredRow,
    dirty: BTreeSet<AuditColumn>,
    logical_delete: bool,
}

impl StampedChange {
    pub fn op(&self) -> WriteOp {
        self.op
    }

    pub fn row(&self) -> &StoredRow {
        &self.row
    }

    pub fn table(&self) -> Table {
        self.row.table
    }

    pub fn id(&self) -> Uuid {
        self.row.audit.id
    }

    /// Audit columns that must be written even if nothing else changed.
    pub fn dirty_columns(&self) -> &BTreeSet<AuditColumn> {
        &self.dirty
    }

    /// Whether this update originated as a removal.
    pub fn is_logical_delete(&self) -> bool {
        self.logical_delete
    }
}

/// Change set ready for a store adapter. Only [`stamp`] builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedChangeSet {
    stamped_at: DateTime<Utc>,
    changes: Vec<StampedChange>,
}

impl StampedChangeSet {
    /// The single instant applied to every change in the batch.
    pub fn stamped_at(&self) -> DateTime<Utc> {
        self.stamped_at
    }

    pub fn changes(&self) -> &[StampedChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Row images as they will be stored.
    pub fn rows(&self) -> impl Iterator<Item = &StoredRow> {
        self.changes.iter().map(StampedChange::row)
    }
}

/// Apply the audit policy to a change set.
///
/// - Added: created and updated dates set to `now`, row active, not deleted.
/// - Modified: updated date moved forward and marked dirty.
/// - Removed: converted to an update that deactivates and deletes the row.
///
/// Updates never move `rowUpdatedDate` backwards: when `now` is not later
/// than the row's previous stamp, the row advances by one microsecond
/// instead. The function is pure; calling it twice with the same input
/// yields equal results, which is what makes commit retries safe.
pub fn stamp(changes: ChangeSet, now: DateTime<Utc>) -> StampedChangeSet {
    let changes = changes
        .changes
        .into_iter()
        .map(|PendingChange { kind, mut row }| {
            let audit = &mut row.audit;
            let mut dirty = BTreeSet::new();
            let (op, logical_delete) = match kind {
                ChangeKind::Added => {
                    audit.row_created_date = now;
                    audit.row_updated_date = now;
                    audit.row_is_active = true;
                    audit.row_is_deleted = false;
                    dirty.extend([
                        AuditColumn::RowCreatedDate,
                        AuditColumn::RowUpdatedDate,
                        AuditColumn::RowIsActive,
                        AuditColumn::RowIsDeleted,
                    ]);
                    (WriteOp::Insert, false)
                }
                ChangeKind::Modified => {
                    audit.row_updated_date = next_update_stamp(audit.row_updated_date, now);
                    dirty.insert(AuditColumn::RowUpdatedDate);
                    (WriteOp::Update, false)
                }
                ChangeKind::Removed => {
                    audit.row_is_active = false;
                    audit.row_is_deleted = true;
                    audit.row_updated_date = next_update_stamp(audit.row_updated_date, now);
                    dirty.extend([
                        AuditColumn::RowUpdatedDate,
                        AuditColumn::RowIsActive,
                        AuditColumn::RowIsDeleted,
                    ]);
                    debug!(table = %row.table, id = %audit.id, "removal converted to soft delete");
                    (WriteOp::Update, true)
                }
            };
            StampedChange {
                op,
                row,
                dirty,
                logical_delete,
            }
        })
        .collect();

    StampedChangeSet {
        stamped_at: now,
        changes,
    }
}

/// `now`, or the smallest instant after `previous` a store can represent.
fn next_update_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    previous
        .checked_add_signed(TimeDelta::microseconds(1))
        .map_or(now, |floor| now.max(floor))
}

#[cfg(test)]
mod tests {
    //! Stamping policy coverage.
    use chrono::{TimeDelta, TimeZone};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn row(audit: AuditFields) -> StoredRow {
        StoredRow {
            table: Table::Businesses,
            audit,
            payload: json!({ "name": "Corner Bakery" }),
        }
    }

    fn live_row(created: DateTime<Utc>) -> StoredRow {
        row(AuditFields::restore(
            Uuid::new_v4(),
            Attribution::default(),
            created,
            created,
            true,
            false,
        ))
    }

    fn single(kind: ChangeKind, row: StoredRow, now: DateTime<Utc>) -> StampedChange {
        let mut set = ChangeSet::default();
        set.push(kind, row);
        let stamped = stamp(set, now);
        stamped.changes().first().cloned().expect("one change")
    }

    #[rstest]
    fn added_rows_are_created_live(now: DateTime<Utc>) {
        let change = single(ChangeKind::Added, row(AuditFields::new(Uuid::new_v4())), now);
        let audit = &change.row().audit;
        assert_eq!(change.op(), WriteOp::Insert);
        assert_eq!(audit.row_created_date(), now);
        assert_eq!(audit.row_updated_date(), audit.row_created_date());
        assert!(audit.row_is_active());
        assert!(!audit.row_is_deleted());
    }

    #[rstest]
    fn added_rows_ignore_handler_supplied_stamps(now: DateTime<Utc>) {
        let forged = AuditFields::restore(
            Uuid::new_v4(),
            Attribution::default(),
            now - TimeDelta::days(30),
            now - TimeDelta::days(2),
            false,
            true,
        );
        let change = single(ChangeKind::Added, row(forged), now);
        assert_eq!(change.row().audit.row_created_date(), now);
        assert!(change.row().audit.is_live());
    }

    #[rstest]
    fn modified_rows_only_touch_updated_date(now: DateTime<Utc>) {
        let created = now - TimeDelta::hours(5);
        let change = single(ChangeKind::Modified, live_row(created), now);
        let audit = &change.row().audit;
        assert_eq!(change.op(), WriteOp::Update);
        assert_eq!(audit.row_created_date(), created);
        assert_eq!(audit.row_updated_date(), now);
        assert!(audit.is_live());
        assert_eq!(
            change.dirty_columns().iter().copied().collect::<Vec<_>>(),
            vec![AuditColumn::RowUpdatedDate]
        );
    }

    #[rstest]
    fn removals_become_soft_delete_updates(now: DateTime<Utc>) {
        let created = now - TimeDelta::hours(1);
        let change = single(ChangeKind::Removed, live_row(created), now);
        let audit = &change.row().audit;
        assert_eq!(change.op(), WriteOp::Update);
        assert!(change.is_logical_delete());
        assert!(!audit.row_is_active());
        assert!(audit.row_is_deleted());
        assert_eq!(audit.row_updated_date(), now);
        assert_eq!(audit.row_created_date(), created);
        assert!(change.dirty_columns().contains(&AuditColumn::RowIsDeleted));
    }

    #[rstest]
    #[case::clock_went_back(TimeDelta::seconds(30))]
    #[case::clock_repeated(TimeDelta::zero())]
    fn updates_move_forward_when_the_clock_does_not(
        now: DateTime<Utc>,
        #[case] behind: TimeDelta,
        #[values(ChangeKind::Modified, ChangeKind::Removed)] kind: ChangeKind,
    ) {
        let previous = row(AuditFields::restore(
            Uuid::new_v4(),
            Attribution::default(),
            now,
            now,
            true,
            false,
        ));
        let change = single(kind, previous, now - behind);
        let audit = &change.row().audit;
        assert_eq!(audit.row_created_date(), now);
        assert_eq!(audit.row_updated_date(), now + TimeDelta::microseconds(1));
    }

    #[rstest]
    fn one_instant_for_the_whole_batch(now: DateTime<Utc>) {
        let mut set = ChangeSet::default();
        set.push(ChangeKind::Added, row(AuditFields::new(Uuid::new_v4())));
        set.push(ChangeKind::Modified, live_row(now - TimeDelta::days(1)));
        set.push(ChangeKind::Removed, live_row(now - TimeDelta::days(1)));
        let stamped = stamp(set, now);
        assert_eq!(stamped.stamped_at(), now);
        assert!(stamped.rows().all(|row| row.audit.row_updated_date() == now));
    }

    #[rstest]
    fn stamping_is_deterministic_for_a_given_instant(now: DateTime<Utc>) {
        let mut set = ChangeSet::default();
        set.push(ChangeKind::Removed, live_row(now - TimeDelta::days(1)));
        assert_eq!(stamp(set.clone(), now), stamp(set, now));
    }

    #[rstest]
    fn attribution_survives_stamping(now: DateTime<Utc>) {
        let owner = Uuid::new_v4();
        let mut audit = AuditFields::new(Uuid::new_v4());
        audit.attribution_mut().auth_user_id = Some(owner);
        let change = single(ChangeKind::Added, row(audit), now);
        assert_eq!(change.row().audit.attribution().auth_user_id, Some(owner));
    }
}
