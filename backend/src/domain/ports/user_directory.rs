//! Port resolving attribution ids to display names.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } => "user directory connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } => "user directory query failed: {message}",
    }
}

/// Display details for a user and the customer they act for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserDetails {
    pub user_name: String,
    pub customer_name: Option<String>,
}

/// Batched lookup of user details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve `ids` in one call. Unknown ids are omitted from the result.
    async fn lookup_users(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, AuthUserDetails>, UserDirectoryError>;
}

/// In-memory directory for tests and databaseless deployments.
#[derive(Debug, Default, Clone)]
pub struct FixtureUserDirectory {
    users: HashMap<Uuid, AuthUserDetails>,
}

impl FixtureUserDirectory {
    #[must_use]
    pub fn with_user(
        mut self,
        id: Uuid,
        user_name: impl Into<String>,
        customer_name: Option<&str>,
    ) -> Self {
        self.users.insert(
            id,
            AuthUserDetails {
                user_name: user_name.into(),
                customer_name: customer_name.map(str::to_owned),
            },
        );
        self
    }
}

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn lookup_users(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, AuthUserDetails>, UserDirectoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|details| (*id, details.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_directory_omits_unknown_ids() {
        let known = Uuid::new_v4();
        let directory = FixtureUserDirectory::default().with_user(known, "Ada", Some("Acme"));
        let found = directory
            .lookup_users(&[known, Uuid::new_v4()])
            .await
            .expect("lookup");
        assert_eq!(found.len(), 1);
        assert_eq!(found.get(&known).map(|d| d.user_name.as_str()), Some("Ada"));
    }
}
