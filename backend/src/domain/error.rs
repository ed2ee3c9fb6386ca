//! Handler failures and their envelope form.
//!
//! Handlers never let a not-found, persistence or messaging problem escape.
//! They build a [`HandlerFailure`] and fold it into a failed
//! [`ResultEnvelope`] at their boundary. Inbound adapters only translate the
//! envelope's status into a transport code.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::entity::Table;
use super::envelope::ResultEnvelope;

/// Stable machine-readable error code placed in `errorData.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed.
    InvalidRequest,
    /// The caller's roles do not grant the endpoint's permission.
    Forbidden,
    /// The target row does not exist or is not visible to the caller.
    NotFound,
    /// The store rejected or failed the commit.
    PersistenceFailure,
    /// The commit applied but the notification could not be sent.
    MessagingFailure,
    /// Attribution details could not be resolved.
    LookupFailure,
    /// An unexpected error occurred inside the backend.
    Internal,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::PersistenceFailure => "persistence_failure",
            Self::MessagingFailure => "messaging_failure",
            Self::LookupFailure => "lookup_failure",
            Self::Internal => "internal",
        }
    }
}

/// Failure raised inside a handler before it is converted to an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerFailure {
    #[error("{} {id} was not found", table.label())]
    NotFound { table: Table, id: Uuid },
    #[error("{message}")]
    Persistence { message: String },
    #[error("{message}")]
    Messaging { table: Table, id: Uuid, message: String },
    #[error("{message}")]
    Lookup { message: String },
}

impl HandlerFailure {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Persistence { .. } => ErrorCode::PersistenceFailure,
            Self::Messaging { .. } => ErrorCode::MessagingFailure,
            Self::Lookup { .. } => ErrorCode::LookupFailure,
        }
    }

    /// Fold the failure into a failed envelope of any payload type.
    ///
    /// # Examples
    /// ```
    /// use guide_backend::domain::{HandlerFailure, ResultEnvelope, Table};
    /// use uuid::Uuid;
    ///
    /// let id = Uuid::nil();
    /// let envelope: ResultEnvelope<()> =
    ///     HandlerFailure::NotFound { table: Table::Reviews, id }.into_envelope();
    /// assert!(!envelope.is_success());
    /// assert_eq!(envelope.error_data().and_then(|d| d.get("code")).and_then(|c| c.as_str()),
    ///     Some("not_found"));
    /// ```
    pub fn into_envelope<R>(self) -> ResultEnvelope<R> {
        let code = self.code().as_str();
        match self {
            Self::NotFound { table, id } => {
                ResultEnvelope::failure(format!("{} was not found.", table.label()))
                    .with_error_data(json!({ "code": code, "entity": table, "id": id }))
                    .with_exception_message(format!("no live {table} row with id {id}"))
            }
            Self::Persistence { message } => {
                ResultEnvelope::failure("The change could not be saved.")
                    .with_error_data(json!({ "code": code }))
                    .with_exception_message(message)
            }
            Self::Messaging { table, id, message } => ResultEnvelope::failure(format!(
                "{} was saved but the notification could not be sent.",
                table.label()
            ))
            .with_error_data(json!({ "code": code, "entity": table, "id": id }))
            .with_exception_message(message),
            Self::Lookup { message } => {
                ResultEnvelope::failure("Owner details could not be loaded.")
                    .with_error_data(json!({ "code": code }))
                    .with_exception_message(message)
            }
        }
    }
}
