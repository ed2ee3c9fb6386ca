//! Permission gate implementations.
//!
//! [`RolePermissionGate`] grants codes through a role map such as
//!
//! ```json
//! { "admin": ["*"], "editor": ["business.*", "review.read"] }
//! ```
//!
//! [`PermissionsNotEnforced`] is the explicit choice for deployments without
//! a role map. It allows every call and says so in the logs.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use super::context::CallerIdentity;
use super::ports::{PermissionCode, PermissionDenied, PermissionGate};

/// Grants every code.
const WILDCARD: &str = "*";

/// Failure loading a role map.
#[derive(Debug, Error)]
pub enum PermissionMapError {
    #[error("failed to read role map {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("role map {path} is not a JSON object of role to code list: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Allow a call iff one of the caller's roles grants its code.
#[derive(Debug, Clone, Default)]
pub struct RolePermissionGate {
    grants: HashMap<String, HashSet<String>>,
}

impl RolePermissionGate {
    pub fn new<R, C, S>(grants: R) -> Self
    where
        R: IntoIterator<Item = (S, C)>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grants = grants
            .into_iter()
            .map(|(role, codes)| (role.into(), codes.into_iter().map(Into::into).collect()))
            .collect();
        Self { grants }
    }

    /// Load a role map from a JSON file.
    ///
    /// # Errors
    /// Fails when the file cannot be read or is not a role map.
    pub fn from_json_file(path: &Path) -> Result<Self, PermissionMapError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| PermissionMapError::Read {
            path: display.clone(),
            source,
        })?;
        let grants: HashMap<String, Vec<String>> =
            serde_json::from_str(&raw).map_err(|source| PermissionMapError::Parse {
                path: display,
                source,
            })?;
        Ok(Self::new(grants))
    }

    fn role_grants(&self, role: &str, code: &PermissionCode) -> bool {
        let Some(codes) = self.grants.get(role) else {
            return false;
        };
        codes.contains(WILDCARD)
            || codes.contains(code.as_str())
            || codes.contains(&format!("{}.{WILDCARD}", code.entity()))
    }
}

impl PermissionGate for RolePermissionGate {
    fn authorize(
        &self,
        caller: &CallerIdentity,
        code: &PermissionCode,
    ) -> Result<(), PermissionDenied> {
        if caller
            .roles()
            .iter()
            .any(|role| self.role_grants(role, code))
        {
            debug!(%code, "permission granted");
            return Ok(());
        }
        warn!(%code, roles = ?caller.roles(), "permission denied");
        Err(PermissionDenied { code: code.clone() })
    }
}

/// Gate that performs no check.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionsNotEnforced;

impl PermissionGate for PermissionsNotEnforced {
    fn authorize(
        &self,
        _caller: &CallerIdentity,
        code: &PermissionCode,
    ) -> Result<(), PermissionDenied> {
        debug!(%code, "permission enforcement is disabled; allowing call");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Role map resolution.
    use std::io::Write;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::entity::{EntityOperation, Table};

    #[fixture]
    fn gate() -> RolePermissionGate {
        RolePermissionGate::new([
            ("admin", vec!["*"]),
            ("editor", vec!["business.*", "review.read"]),
            ("viewer", vec!["category.list"]),
        ])
    }

    fn code(table: Table, operation: EntityOperation) -> PermissionCode {
        PermissionCode::for_entity(table, operation)
    }

    #[rstest]
    #[case("admin", Table::Payments, EntityOperation::Delete, true)]
    #[case("editor", Table::Businesses, EntityOperation::Delete, true)]
    #[case("editor", Table::Reviews, EntityOperation::Read, true)]
    #[case("editor", Table::Reviews, EntityOperation::Delete, false)]
    #[case("viewer", Table::Categories, EntityOperation::List, true)]
    #[case("viewer", Table::Categories, EntityOperation::Create, false)]
    #[case("stranger", Table::Categories, EntityOperation::List, false)]
    fn roles_grant_codes(
        gate: RolePermissionGate,
        #[case] role: &str,
        #[case] table: Table,
        #[case] operation: EntityOperation,
        #[case] allowed: bool,
    ) {
        let caller = CallerIdentity::anonymous().with_roles([role]);
        assert_eq!(gate.authorize(&caller, &code(table, operation)).is_ok(), allowed);
    }

    #[rstest]
    fn callers_without_roles_are_denied(gate: RolePermissionGate) {
        let denied = gate
            .authorize(
                &CallerIdentity::anonymous(),
                &code(Table::Reviews, EntityOperation::Read),
            )
            .expect_err("no roles");
        assert_eq!(denied.code.as_str(), "review.read");
    }

    #[rstest]
    fn not_enforced_allows_everything() {
        let result = PermissionsNotEnforced.authorize(
            &CallerIdentity::anonymous(),
            &code(Table::Payments, EntityOperation::Delete),
        );
        assert!(result.is_ok());
    }

    #[rstest]
    fn loads_role_map_from_json() {
        let path = std::env::temp_dir().join(format!("guide-roles-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).expect("create role map");
        file.write_all(br#"{ "support": ["subscription.read"] }"#)
            .expect("write role map");
        let gate = RolePermissionGate::from_json_file(&path).expect("load role map");
        std::fs::remove_file(&path).expect("remove role map");

        let caller = CallerIdentity::anonymous().with_roles(["support"]);
        assert!(
            gate.authorize(&caller, &code(Table::Subscriptions, EntityOperation::Read))
                .is_ok()
        );
    }

    #[rstest]
    fn malformed_role_map_is_rejected() {
        let path = std::env::temp_dir().join(format!("guide-roles-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[]").expect("write role map");
        let err = RolePermissionGate::from_json_file(&path).expect_err("not a map");
        std::fs::remove_file(&path).expect("remove role map");
        assert!(matches!(err, PermissionMapError::Parse { .. }));
    }
}
