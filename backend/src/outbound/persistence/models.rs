//! Internal Diesel row structs. Never exposed outside the persistence layer.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{auth_users, guide_rows};
use crate::domain::audit::{Attribution, AuditFields};
use crate::domain::entity::{StoredRow, Table, UnknownTableError};
use crate::domain::ports::AuthUserDetails;

/// Full `guide_rows` image, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = guide_rows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GuideRowRecord {
    pub table_name: String,
    pub id: Uuid,
    pub payload: Value,
    pub create_user_id: Option<Uuid>,
    pub update_user_id: Option<Uuid>,
    pub auth_user_id: Option<Uuid>,
    pub auth_customer_id: Option<Uuid>,
    pub row_created_date: DateTime<Utc>,
    pub row_updated_date: DateTime<Utc>,
    pub row_is_active: bool,
    pub row_is_deleted: bool,
}

impl From<&StoredRow> for GuideRowRecord {
    fn from(row: &StoredRow) -> Self {
        let audit = &row.audit;
        let attribution = audit.attribution();
        Self {
            table_name: row.table.as_str().to_owned(),
            id: audit.id(),
            payload: row.payload.clone(),
            create_user_id: attribution.create_user_id,
            update_user_id: attribution.update_user_id,
            auth_user_id: attribution.auth_user_id,
            auth_customer_id: attribution.auth_customer_id,
            row_created_date: audit.row_created_date(),
            row_updated_date: audit.row_updated_date(),
            row_is_active: audit.row_is_active(),
            row_is_deleted: audit.row_is_deleted(),
        }
    }
}

impl TryFrom<GuideRowRecord> for StoredRow {
    type Error = UnknownTableError;

    fn try_from(record: GuideRowRecord) -> Result<Self, Self::Error> {
        let table: Table = record.table_name.parse()?;
        let attribution = Attribution {
            create_user_id: record.create_user_id,
            update_user_id: record.update_user_id,
            auth_user_id: record.auth_user_id,
            auth_customer_id: record.auth_customer_id,
        };
        Ok(Self {
            table,
            audit: AuditFields::restore(
                record.id,
                attribution,
                record.row_created_date,
                record.row_updated_date,
                record.row_is_active,
                record.row_is_deleted,
            ),
            payload: record.payload,
        })
    }
}

/// Columns an update may change. The key, creation date and creator stay put.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = guide_rows)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct GuideRowChanges {
    pub payload: Value,
    pub update_user_id: Option<Uuid>,
    pub auth_user_id: Option<Uuid>,
    pub auth_customer_id: Option<Uuid>,
    pub row_updated_date: DateTime<Utc>,
    pub row_is_active: bool,
    pub row_is_deleted: bool,
}

impl From<&StoredRow> for GuideRowChanges {
    fn from(row: &StoredRow) -> Self {
        let audit = &row.audit;
        let attribution = audit.attribution();
        Self {
            payload: row.payload.clone(),
            update_user_id: attribution.update_user_id,
            auth_user_id: attribution.auth_user_id,
            auth_customer_id: attribution.auth_customer_id,
            row_updated_date: audit.row_updated_date(),
            row_is_active: audit.row_is_active(),
            row_is_deleted: audit.row_is_deleted(),
        }
    }
}

/// Row struct for reading from the `auth_users` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = auth_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuthUserRow {
    pub id: Uuid,
    pub user_name: String,
    pub customer_name: Option<String>,
}

impl From<AuthUserRow> for (Uuid, AuthUserDetails) {
    fn from(row: AuthUserRow) -> Self {
        (
            row.id,
            AuthUserDetails {
                user_name: row.user_name,
                customer_name: row.customer_name,
            },
        )
    }
}
