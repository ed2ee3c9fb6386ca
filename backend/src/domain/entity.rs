//! Entity shapes shared by every guide table.
//!
//! A persisted row is a [`Record`]: the audit columns every table carries plus
//! an entity-specific body implementing [`EntityBody`]. Stores never see the
//! typed body; they move [`StoredRow`] values whose payload is the body's JSON
//! object, which keeps one store adapter usable for every table.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::audit::{Attribution, AuditFields};
use super::messaging::QueueName;

/// Logical tables known to the guide backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Categories,
    Businesses,
    Reviews,
    Subscriptions,
    Payments,
    JobPostings,
}

impl Table {
    /// Every table, in registration order.
    pub const ALL: [Self; 6] = [
        Self::Categories,
        Self::Businesses,
        Self::Reviews,
        Self::Subscriptions,
        Self::Payments,
        Self::JobPostings,
    ];

    /// Storage name, also used as the `table_name` column value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Businesses => "businesses",
            Self::Reviews => "reviews",
            Self::Subscriptions => "subscriptions",
            Self::Payments => "payments",
            Self::JobPostings => "job_postings",
        }
    }

    /// Human-readable singular label used in envelope messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Categories => "Category",
            Self::Businesses => "Business",
            Self::Reviews => "Review",
            Self::Subscriptions => "Subscription",
            Self::Payments => "Payment",
            Self::JobPostings => "Job posting",
        }
    }

    /// URL path segment under `/api/v1`.
    pub const fn route_segment(self) -> &'static str {
        match self {
            Self::JobPostings => "job-postings",
            other => other.as_str(),
        }
    }

    /// Prefix of the permission codes guarding this table.
    pub const fn permission_prefix(self) -> &'static str {
        match self {
            Self::Categories => "category",
            Self::Businesses => "business",
            Self::Reviews => "review",
            Self::Subscriptions => "subscription",
            Self::Payments => "payment",
            Self::JobPostings => "job_posting",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored table name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown table name: {0}")]
pub struct UnknownTableError(pub String);

impl FromStr for Table {
    type Err = UnknownTableError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str() == value)
            .ok_or_else(|| UnknownTableError(value.to_owned()))
    }
}

/// Operations every entity supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOperation {
    Create,
    Read,
    List,
    Update,
    Delete,
}

impl EntityOperation {
    /// Suffix used in permission codes and message payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for EntityOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ownership column as seen by auth scoping.
///
/// `Unsupported` means the entity has no such column, so a filter on it is a
/// no-op. `Value(None)` means the column exists but is empty, so a filter on
/// it excludes the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerField {
    Unsupported,
    Value(Option<Uuid>),
}

impl OwnerField {
    /// Whether a filter for `wanted` keeps a row exposing this field.
    pub fn admits(self, wanted: Uuid) -> bool {
        match self {
            Self::Unsupported => true,
            Self::Value(actual) => actual == Some(wanted),
        }
    }
}

/// Capability consulted by the auth-scoped query helpers.
///
/// Both methods default to [`OwnerField::Unsupported`]; shapes that carry an
/// owner column override the relevant method.
pub trait OwnerScoped {
    /// Owning user column.
    fn owner_user(&self) -> OwnerField {
        OwnerField::Unsupported
    }

    /// Owning customer column.
    fn owner_customer(&self) -> OwnerField {
        OwnerField::Unsupported
    }
}

/// Attribution columns that back a body's ownership hooks.
///
/// Stores filter on these columns while listing. A flag must be set only
/// when the matching hook returns that attribution column unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnerColumns {
    pub user: bool,
    pub customer: bool,
}

impl OwnerColumns {
    pub const NONE: Self = Self {
        user: false,
        customer: false,
    };
    pub const USER: Self = Self {
        user: true,
        customer: false,
    };
    pub const CUSTOMER: Self = Self {
        user: false,
        customer: true,
    };
    pub const BOTH: Self = Self {
        user: true,
        customer: true,
    };
}

/// Entity-specific part of a guide row.
///
/// Bodies serialise to flat JSON objects. The defaults describe an entity
/// with no ownership columns that publishes no notifications.
pub trait EntityBody:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Table the body is stored in.
    const TABLE: Table;

    /// Ownership hooks a store can evaluate from attribution columns alone.
    const OWNER_COLUMNS: OwnerColumns = OwnerColumns::NONE;

    /// Owning user for auth scoping.
    fn owner_user(&self, _audit: &AuditFields) -> OwnerField {
        OwnerField::Unsupported
    }

    /// Owning customer for auth scoping.
    fn owner_customer(&self, _audit: &AuditFields) -> OwnerField {
        OwnerField::Unsupported
    }

    /// Queue notified after a successful commit of `operation`, if any.
    fn notification(_operation: EntityOperation) -> Option<QueueName> {
        None
    }
}

/// A typed guide row: audit columns plus entity body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<B> {
    #[serde(flatten)]
    audit: AuditFields,
    #[serde(flatten)]
    body: B,
}

impl<B: EntityBody> Record<B> {
    /// Build an unsaved record. Timestamps and flags are placeholders until
    /// the audit interceptor stamps them at commit.
    pub fn new(id: Uuid, body: B) -> Self {
        Self {
            audit: AuditFields::new(id),
            body,
        }
    }

    pub fn id(&self) -> Uuid {
        self.audit.id()
    }

    pub fn audit(&self) -> &AuditFields {
        &self.audit
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    /// Replace the body, keeping the audit columns.
    pub fn replace_body(&mut self, body: B) {
        self.body = body;
    }

    /// Mutable access to the attribution columns.
    pub fn attribution_mut(&mut self) -> &mut Attribution {
        self.audit.attribution_mut()
    }

    /// Encode into the storage shape.
    ///
    /// # Errors
    /// Fails when the body does not serialise to a JSON object.
    pub fn to_row(&self) -> Result<StoredRow, RowCodecError> {
        let payload = serde_json::to_value(&self.body).map_err(|err| RowCodecError::Encode {
            table: B::TABLE,
            message: err.to_string(),
        })?;
        if !payload.is_object() {
            return Err(RowCodecError::Encode {
                table: B::TABLE,
                message: "entity body must serialise to a JSON object".to_owned(),
            });
        }
        Ok(StoredRow {
            table: B::TABLE,
            audit: self.audit.clone(),
            payload,
        })
    }

    /// Decode from the storage shape.
    ///
    /// # Errors
    /// Fails when the row belongs to another table or the payload does not
    /// match the body type.
    pub fn from_row(row: StoredRow) -> Result<Self, RowCodecError> {
        if row.table != B::TABLE {
            return Err(RowCodecError::TableMismatch {
                expected: B::TABLE,
                actual: row.table,
            });
        }
        let body = serde_json::from_value(row.payload).map_err(|err| RowCodecError::Decode {
            table: B::TABLE,
            message: err.to_string(),
        })?;
        Ok(Self {
            audit: row.audit,
            body,
        })
    }
}

impl<B: EntityBody> OwnerScoped for Record<B> {
    fn owner_user(&self) -> OwnerField {
        self.body.owner_user(&self.audit)
    }

    fn owner_customer(&self) -> OwnerField {
        self.body.owner_customer(&self.audit)
    }
}

/// Table-agnostic row image exchanged with store adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub table: Table,
    pub audit: AuditFields,
    pub payload: Value,
}

/// Failures converting between [`Record`] and [`StoredRow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowCodecError {
    #[error("failed to encode {table} row: {message}")]
    Encode { table: Table, message: String },
    #[error("failed to decode {table} row: {message}")]
    Decode { table: Table, message: String },
    #[error("expected a {expected} row but found {actual}")]
    TableMismatch { expected: Table, actual: Table },
}
