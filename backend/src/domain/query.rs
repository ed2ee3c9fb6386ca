//! Auth-scoped filtering, pagination and attribution lookup.
//!
//! These helpers are generic over [`OwnerScoped`], so one implementation
//! serves every table. A table without an ownership column simply skips the
//! corresponding filter.

use std::collections::{BTreeSet, HashMap};

use pagination::PageRequest;
use tracing::debug;
use uuid::Uuid;

use super::entity::OwnerScoped;
use super::ports::{AuthUserDetails, UserDirectory, UserDirectoryError};

/// Caller-derived filters. `None` disables the corresponding filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthScope {
    pub user_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

impl AuthScope {
    /// Scope that sees every row.
    pub const fn unrestricted() -> Self {
        Self {
            user_id: None,
            customer_id: None,
        }
    }
}

/// Whether `row` is visible under `scope`.
pub fn is_visible<T: OwnerScoped + ?Sized>(row: &T, scope: &AuthScope) -> bool {
    let user_ok = scope
        .user_id
        .is_none_or(|wanted| row.owner_user().admits(wanted));
    let customer_ok = scope
        .customer_id
        .is_none_or(|wanted| row.owner_customer().admits(wanted));
    user_ok && customer_ok
}

/// Keep the rows visible under `scope`, preserving order.
///
/// # Examples
/// ```
/// use guide_backend::domain::{apply_auth_filters, AuthScope, OwnerField, OwnerScoped};
/// use uuid::Uuid;
///
/// struct Note(Option<Uuid>);
/// impl OwnerScoped for Note {
///     fn owner_user(&self) -> OwnerField {
///         OwnerField::Value(self.0)
///     }
/// }
///
/// let me = Uuid::new_v4();
/// let rows = vec![Note(Some(me)), Note(None), Note(Some(Uuid::new_v4()))];
/// let scope = AuthScope { user_id: Some(me), customer_id: None };
/// assert_eq!(apply_auth_filters(rows, &scope).len(), 1);
/// ```
pub fn apply_auth_filters<T, I>(rows: I, scope: &AuthScope) -> Vec<T>
where
    T: OwnerScoped,
    I: IntoIterator<Item = T>,
{
    rows.into_iter().filter(|row| is_visible(row, scope)).collect()
}

/// Zero-based slice `[page * size, page * size + size)` of `rows`.
///
/// A non-positive `size`, a negative `page` or an overflowing offset yields
/// an empty vector.
pub fn apply_pagination<T>(rows: Vec<T>, page: i64, size: i64) -> Vec<T> {
    PageRequest::new(page, size).apply(rows)
}

/// Resolve attribution ids to display details with a single batched lookup.
///
/// Duplicates are collapsed before the call and no call is made for an empty
/// list. Ids the directory cannot resolve are absent from the result.
///
/// # Errors
/// Propagates the directory failure.
pub async fn get_auth_user_details(
    directory: &dyn UserDirectory,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, AuthUserDetails>, UserDirectoryError> {
    let unique: Vec<Uuid> = ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if unique.is_empty() {
        return Ok(HashMap::new());
    }
    debug!(requested = ids.len(), unique = unique.len(), "resolving auth users");
    let mut found = directory.lookup_users(&unique).await?;
    found.retain(|id, _| unique.binary_search(id).is_ok());
    Ok(found)
}

#[cfg(test)]
mod tests {
    //! Filter, paging and lookup behaviour.
    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::entity::OwnerField;
    use crate::domain::ports::MockUserDirectory;

    #[derive(Debug, Clone, PartialEq)]
    struct Owned {
        user: Option<Uuid>,
        customer: Option<Uuid>,
    }

    impl OwnerScoped for Owned {
        fn owner_user(&self) -> OwnerField {
            OwnerField::Value(self.user)
        }

        fn owner_customer(&self) -> OwnerField {
            OwnerField::Value(self.customer)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Unowned(u8);

    impl OwnerScoped for Unowned {}

    #[rstest]
    fn user_filter_keeps_only_matching_owner() {
        let me = Uuid::new_v4();
        let rows = vec![
            Owned { user: Some(me), customer: None },
            Owned { user: None, customer: None },
            Owned { user: Some(Uuid::new_v4()), customer: None },
        ];
        let scope = AuthScope { user_id: Some(me), customer_id: None };
        let kept = apply_auth_filters(rows, &scope);
        assert_eq!(kept, vec![Owned { user: Some(me), customer: None }]);
    }

    #[rstest]
    fn filters_apply_independently() {
        let user = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let rows = vec![
            Owned { user: Some(user), customer: Some(customer) },
            Owned { user: Some(user), customer: Some(Uuid::new_v4()) },
        ];
        let scope = AuthScope { user_id: Some(user), customer_id: Some(customer) };
        assert_eq!(apply_auth_filters(rows, &scope).len(), 1);
    }

    #[rstest]
    fn unsupported_fields_are_not_filtered() {
        let rows = vec![Unowned(1), Unowned(2)];
        let scope = AuthScope { user_id: Some(Uuid::new_v4()), customer_id: Some(Uuid::new_v4()) };
        assert_eq!(apply_auth_filters(rows, &scope), vec![Unowned(1), Unowned(2)]);
    }

    #[rstest]
    fn unrestricted_scope_keeps_everything() {
        let rows = vec![Owned { user: None, customer: None }];
        assert_eq!(apply_auth_filters(rows, &AuthScope::unrestricted()).len(), 1);
    }

    #[rstest]
    fn second_page_of_ten_over_twenty_five() {
        let rows: Vec<u32> = (0..25).collect();
        assert_eq!(apply_pagination(rows, 1, 10), (10..20).collect::<Vec<_>>());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(0, -1)]
    #[case(-2, 5)]
    fn degenerate_pages_are_empty(#[case] page: i64, #[case] size: i64) {
        assert!(apply_pagination(vec![1, 2, 3], page, size).is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_ids_trigger_one_batched_lookup() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let mut directory = MockUserDirectory::new();
        directory
            .expect_lookup_users()
            .with(eq(vec![u1, u2]))
            .times(1)
            .returning(move |_| {
                Ok(HashMap::from([(
                    u1,
                    AuthUserDetails { user_name: "Ada".to_owned(), customer_name: None },
                )]))
            });

        let found = get_auth_user_details(&directory, &[u1, u1, u2])
            .await
            .expect("lookup");
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&u1));
        assert!(!found.contains_key(&u2));
    }

    #[rstest]
    #[tokio::test]
    async fn empty_input_skips_the_directory() {
        let mut directory = MockUserDirectory::new();
        directory.expect_lookup_users().times(0);
        let found = get_auth_user_details(&directory, &[]).await.expect("lookup");
        assert!(found.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn unrequested_ids_are_dropped() {
        let asked = Uuid::from_u128(3);
        let extra = Uuid::from_u128(4);
        let mut directory = MockUserDirectory::new();
        directory.expect_lookup_users().returning(move |_| {
            Ok(HashMap::from([(
                extra,
                AuthUserDetails { user_name: "Stray".to_owned(), customer_name: None },
            )]))
        });
        let found = get_auth_user_details(&directory, &[asked]).await.expect("lookup");
        assert!(found.is_empty());
    }
}
