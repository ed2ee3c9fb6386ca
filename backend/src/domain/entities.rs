//! Guide entity bodies.
//!
//! Each body carries only its business fields; audit columns live on the
//! surrounding [`Record`](super::entity::Record). Ownership hooks decide which
//! auth-scope filters apply to the table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::AuditFields;
use super::entity::{EntityBody, EntityOperation, OwnerColumns, OwnerField, Table};
use super::messaging::QueueName;

fn owning_user(audit: &AuditFields) -> OwnerField {
    OwnerField::Value(audit.attribution().auth_user_id)
}

fn owning_customer(audit: &AuditFields) -> OwnerField {
    OwnerField::Value(audit.attribution().auth_customer_id)
}

/// Directory category. Visible to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl EntityBody for Category {
    const TABLE: Table = Table::Categories;
}

/// A listed business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub name: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl EntityBody for Business {
    const TABLE: Table = Table::Businesses;
    const OWNER_COLUMNS: OwnerColumns = OwnerColumns::BOTH;

    fn owner_user(&self, audit: &AuditFields) -> OwnerField {
        owning_user(audit)
    }

    fn owner_customer(&self, audit: &AuditFields) -> OwnerField {
        owning_customer(audit)
    }

    fn notification(operation: EntityOperation) -> Option<QueueName> {
        matches!(operation, EntityOperation::Create).then_some(QueueName::BusinessCreated)
    }
}

/// A review left on a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub business_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

impl EntityBody for Review {
    const TABLE: Table = Table::Reviews;
    const OWNER_COLUMNS: OwnerColumns = OwnerColumns::USER;

    fn owner_user(&self, audit: &AuditFields) -> OwnerField {
        owning_user(audit)
    }

    fn notification(operation: EntityOperation) -> Option<QueueName> {
        matches!(operation, EntityOperation::Create).then_some(QueueName::ReviewSubmitted)
    }
}

/// A customer's listing plan.
///
/// The owning customer is the body's own `customerId`, not the caller that
/// created the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub customer_id: Uuid,
    pub plan: String,
    #[serde(default)]
    pub renews_on: Option<NaiveDate>,
}

impl EntityBody for Subscription {
    const TABLE: Table = Table::Subscriptions;
    const OWNER_COLUMNS: OwnerColumns = OwnerColumns::USER;

    fn owner_user(&self, audit: &AuditFields) -> OwnerField {
        owning_user(audit)
    }

    fn owner_customer(&self, _audit: &AuditFields) -> OwnerField {
        OwnerField::Value(Some(self.customer_id))
    }

    fn notification(operation: EntityOperation) -> Option<QueueName> {
        matches!(
            operation,
            EntityOperation::Create | EntityOperation::Update | EntityOperation::Delete
        )
        .then_some(QueueName::SubscriptionChanged)
    }
}

/// A payment against a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub subscription_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub reference: Option<String>,
}

impl EntityBody for Payment {
    const TABLE: Table = Table::Payments;
    const OWNER_COLUMNS: OwnerColumns = OwnerColumns::BOTH;

    fn owner_user(&self, audit: &AuditFields) -> OwnerField {
        owning_user(audit)
    }

    fn owner_customer(&self, audit: &AuditFields) -> OwnerField {
        owning_customer(audit)
    }

    fn notification(operation: EntityOperation) -> Option<QueueName> {
        matches!(operation, EntityOperation::Create).then_some(QueueName::PaymentReceived)
    }
}

/// A vacancy advertised by a business. Shared across a customer's users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub business_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub salary_range: Option<String>,
}

impl EntityBody for JobPosting {
    const TABLE: Table = Table::JobPostings;
    const OWNER_COLUMNS: OwnerColumns = OwnerColumns::CUSTOMER;

    fn owner_customer(&self, audit: &AuditFields) -> OwnerField {
        owning_customer(audit)
    }

    fn notification(operation: EntityOperation) -> Option<QueueName> {
        matches!(operation, EntityOperation::Create).then_some(QueueName::JobPostingPublished)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::entity::{OwnerScoped, Record};

    #[rstest]
    fn categories_ignore_ownership() {
        let record = Record::new(
            Uuid::new_v4(),
            Category {
                name: "Bakeries".to_owned(),
                slug: "bakeries".to_owned(),
                description: None,
            },
        );
        assert_eq!(record.owner_user(), OwnerField::Unsupported);
        assert_eq!(record.owner_customer(), OwnerField::Unsupported);
    }

    #[rstest]
    fn subscriptions_are_owned_by_their_customer_field() {
        let customer = Uuid::new_v4();
        let mut record = Record::new(
            Uuid::new_v4(),
            Subscription {
                customer_id: customer,
                plan: "premium".to_owned(),
                renews_on: None,
            },
        );
        record.attribution_mut().auth_customer_id = Some(Uuid::new_v4());
        assert_eq!(record.owner_customer(), OwnerField::Value(Some(customer)));
    }

    #[rstest]
    fn job_postings_are_customer_scoped_only() {
        let record = Record::new(
            Uuid::new_v4(),
            JobPosting {
                business_id: Uuid::new_v4(),
                title: "Barista".to_owned(),
                description: "Morning shifts".to_owned(),
                salary_range: None,
            },
        );
        assert_eq!(record.owner_user(), OwnerField::Unsupported);
        assert_eq!(record.owner_customer(), OwnerField::Value(None));
    }

    /// Declared store-side columns must agree with the ownership hooks.
    fn assert_owner_columns_match_hooks<B: EntityBody>(body: B) {
        let user = Uuid::from_u128(1);
        let customer = Uuid::from_u128(2);
        let mut record = Record::new(Uuid::new_v4(), body);
        record.attribution_mut().auth_user_id = Some(user);
        record.attribution_mut().auth_customer_id = Some(customer);
        if B::OWNER_COLUMNS.user {
            assert_eq!(record.owner_user(), OwnerField::Value(Some(user)), "{}", B::TABLE);
        }
        if B::OWNER_COLUMNS.customer {
            assert_eq!(
                record.owner_customer(),
                OwnerField::Value(Some(customer)),
                "{}",
                B::TABLE
            );
        }
    }

    #[rstest]
    fn owner_columns_agree_with_ownership_hooks() {
        assert_owner_columns_match_hooks(Business {
            name: "Corner Bakery".to_owned(),
            category_id: Uuid::nil(),
            address: None,
            phone: None,
            website: None,
        });
        assert_owner_columns_match_hooks(Review {
            business_id: Uuid::nil(),
            rating: 4,
            comment: None,
        });
        assert_owner_columns_match_hooks(Subscription {
            customer_id: Uuid::new_v4(),
            plan: "basic".to_owned(),
            renews_on: None,
        });
        assert_owner_columns_match_hooks(Payment {
            subscription_id: Uuid::nil(),
            amount_cents: 1500,
            currency: "EUR".to_owned(),
            reference: None,
        });
        assert_owner_columns_match_hooks(JobPosting {
            business_id: Uuid::nil(),
            title: "Barista".to_owned(),
            description: "Morning shifts".to_owned(),
            salary_range: None,
        });
        assert_eq!(Subscription::OWNER_COLUMNS, OwnerColumns::USER);
        assert_eq!(Category::OWNER_COLUMNS, OwnerColumns::NONE);
    }

    #[rstest]
    #[case(EntityOperation::Create, Some(QueueName::SubscriptionChanged))]
    #[case(EntityOperation::Delete, Some(QueueName::SubscriptionChanged))]
    #[case(EntityOperation::Read, None)]
    fn subscription_notifications(
        #[case] operation: EntityOperation,
        #[case] expected: Option<QueueName>,
    ) {
        assert_eq!(Subscription::notification(operation), expected);
    }

    #[rstest]
    fn optional_fields_may_be_omitted() {
        let business: Business = serde_json::from_value(json!({
            "name": "Corner Bakery",
            "categoryId": Uuid::nil(),
        }))
        .expect("minimal business");
        assert!(business.website.is_none());
    }
}
