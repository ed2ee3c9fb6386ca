//! Port deciding whether a caller may invoke an endpoint.

use std::fmt;

use thiserror::Error;

use crate::domain::context::CallerIdentity;
use crate::domain::entity::{EntityOperation, Table};

/// Permission code of the form `<entity>.<operation>`, e.g. `business.delete`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionCode(String);

impl PermissionCode {
    pub fn for_entity(table: Table, operation: EntityOperation) -> Self {
        Self(format!("{}.{}", table.permission_prefix(), operation.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<entity>` part of the code.
    pub fn entity(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(entity, _)| entity)
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller's roles do not grant the requested code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("caller lacks permission {code}")]
pub struct PermissionDenied {
    pub code: PermissionCode,
}

/// Authorisation decision made before dispatch. Handlers trust its verdict.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionGate: Send + Sync {
    /// # Errors
    /// Returns [`PermissionDenied`] when the caller may not proceed.
    fn authorize(
        &self,
        caller: &CallerIdentity,
        code: &PermissionCode,
    ) -> Result<(), PermissionDenied>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Table::JobPostings, EntityOperation::Delete, "job_posting.delete")]
    #[case(Table::Categories, EntityOperation::List, "category.list")]
    fn codes_combine_prefix_and_operation(
        #[case] table: Table,
        #[case] operation: EntityOperation,
        #[case] expected: &str,
    ) {
        let code = PermissionCode::for_entity(table, operation);
        assert_eq!(code.as_str(), expected);
        assert_eq!(code.entity(), table.permission_prefix());
    }
}
