//! Generic create, read, list, update and delete handlers.
//!
//! One handler per verb, parameterised over [`EntityBody`]. Registering a
//! body type wires all five request types for its table, so the six guide
//! tables share one implementation.
//!
//! Every handler follows the same shape: resolve the target under the
//! caller's auth scope, change it through a [`UnitOfWork`], commit once, then
//! optionally publish a notification. Failures are folded into envelopes by
//! [`conclude`]; only cancellation escapes.

mod create;
mod delete;
mod get;
mod list;
mod update;


use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use pagination::{Page, PageRequest};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::context::{Cancelled, RequestContext};
use super::data_context::{DataContext, DataError, UnitOfWork};
use super::dispatcher::{DispatcherBuilder, RegistrationError, Request};
use super::entities::{Business, Category, JobPosting, Payment, Review, Subscription};
use super::entity::{EntityBody, EntityOperation, Record, RowCodecError, Table};
use super::envelope::ResultEnvelope;
use super::error::HandlerFailure;
use super::messaging::flat_payload;
use super::ports::{AuthUserDetails, MessagePublisher, UserDirectory};
use super::query::{get_auth_user_details, is_visible};

/// Create a row of `B`.
#[derive(Debug, Clone)]
pub struct CreateEntity<B> {
    pub body: B,
}

impl<B> CreateEntity<B> {
    pub const fn new(body: B) -> Self {
        Self { body }
    }
}

/// Read one live row of `B` visible to the caller.
#[derive(Debug, Clone, Copy)]
pub struct GetEntity<B> {
    pub id: Uuid,
    marker: PhantomData<fn() -> B>,
}

impl<B> GetEntity<B> {
    pub const fn new(id: Uuid) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }
}

/// Page through the live rows of `B` visible to the caller.
#[derive(Debug, Clone, Copy)]
pub struct ListEntities<B> {
    pub page: PageRequest,
    marker: PhantomData<fn() -> B>,
}

impl<B> ListEntities<B> {
    pub const fn new(page: PageRequest) -> Self {
        Self {
            page,
            marker: PhantomData,
        }
    }
}

/// Replace the body of a live row of `B`.
#[derive(Debug, Clone)]
pub struct UpdateEntity<B> {
    pub id: Uuid,
    pub body: B,
}

impl<B> UpdateEntity<B> {
    pub const fn new(id: Uuid, body: B) -> Self {
        Self { id, body }
    }
}

/// Soft-delete a live row of `B`.
#[derive(Debug, Clone, Copy)]
pub struct DeleteEntity<B> {
    pub id: Uuid,
    marker: PhantomData<fn() -> B>,
}

impl<B> DeleteEntity<B> {
    pub const fn new(id: Uuid) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }
}

/// A row as returned to callers, with its owner's display details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView<B> {
    #[serde(flatten)]
    pub record: Record<B>,
    pub auth_user_details: Option<AuthUserDetails>,
}

/// Acknowledgement of a soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedEntity {
    pub id: Uuid,
    pub entity: Table,
}

impl<B: EntityBody> Request for CreateEntity<B> {
    type Response = EntityView<B>;
}

impl<B: EntityBody> Request for GetEntity<B> {
    type Response = EntityView<B>;
}

impl<B: EntityBody> Request for ListEntities<B> {
    type Response = Page<EntityView<B>>;
}

impl<B: EntityBody> Request for UpdateEntity<B> {
    type Response = EntityView<B>;
}

impl<B: EntityBody> Request for DeleteEntity<B> {
    type Response = DeletedEntity;
}

/// Collaborators shared by every entity handler.
#[derive(Clone)]
pub struct EntityHandlerDeps {
    pub data: DataContext,
    pub publisher: Arc<dyn MessagePublisher>,
    pub directory: Arc<dyn UserDirectory>,
}

/// The five verb handlers for one body type.
pub struct EntityHandlers<B> {
    deps: EntityHandlerDeps,
    marker: PhantomData<fn() -> B>,
}

impl<B: EntityBody> EntityHandlers<B> {
    pub fn new(deps: EntityHandlerDeps) -> Self {
        Self {
            deps,
            marker: PhantomData,
        }
    }

    /// Load a live row the caller may see.
    async fn load_visible(
        &self,
        id: Uuid,
        context: &RequestContext,
    ) -> Result<Record<B>, HandlerStop> {
        let scope = context.caller().auth_scope();
        self.deps
            .data
            .find::<B>(id, context.cancellation())
            .await?
            .filter(|record| is_visible(record, &scope))
            .ok_or(HandlerStop::Failure(HandlerFailure::NotFound {
                table: B::TABLE,
                id,
            }))
    }

    /// Commit `work` and return the stamped image of row `id`.
    async fn commit_one(
        &self,
        work: UnitOfWork,
        id: Uuid,
        context: &RequestContext,
    ) -> Result<Record<B>, HandlerStop> {
        let receipt = self.deps.data.commit(work, context.cancellation()).await?;
        Ok(receipt.record::<B>(id)?)
    }

    /// Publish the table's notification for `operation`, if it has one.
    async fn notify(
        &self,
        operation: EntityOperation,
        record: &Record<B>,
        context: &RequestContext,
    ) -> Result<(), HandlerStop> {
        let Some(queue) = B::notification(operation) else {
            return Ok(());
        };
        let messaging = |message: String| {
            HandlerStop::Failure(HandlerFailure::Messaging {
                table: B::TABLE,
                id: record.id(),
                message,
            })
        };
        let payload = notification_payload(operation, record)
            .and_then(|value| flat_payload(&value).map_err(|err| err.to_string()))
            .map_err(messaging)?;
        let ack = context
            .guard(self.deps.publisher.send(queue, payload))
            .await?
            .map_err(|err| messaging(err.to_string()))?;
        info!(%queue, ack = %ack.0, id = %record.id(), "notification published");
        Ok(())
    }

    /// Attach owner details to a freshly written row. Lookup failures only
    /// cost the details.
    async fn view_after_write(
        &self,
        record: Record<B>,
        context: &RequestContext,
    ) -> Result<EntityView<B>, Cancelled> {
        match self.owner_details(std::slice::from_ref(&record), context).await {
            Ok(details) => Ok(view_of(record, &details)),
            Err(HandlerStop::Cancelled) => Err(Cancelled),
            Err(HandlerStop::Failure(failure)) => {
                warn!(error = %failure, table = %B::TABLE, "owner details unavailable");
                Ok(EntityView {
                    record,
                    auth_user_details: None,
                })
            }
        }
    }

    /// Resolve the owners of `records` with one directory lookup.
    async fn owner_details(
        &self,
        records: &[Record<B>],
        context: &RequestContext,
    ) -> Result<HashMap<Uuid, AuthUserDetails>, HandlerStop> {
        let owners: Vec<Uuid> = records
            .iter()
            .filter_map(|record| record.audit().attribution().auth_user_id)
            .collect();
        context
            .guard(get_auth_user_details(self.deps.directory.as_ref(), &owners))
            .await?
            .map_err(|err| {
                HandlerStop::Failure(HandlerFailure::Lookup {
                    message: err.to_string(),
                })
            })
    }
}

fn view_of<B>(record: Record<B>, details: &HashMap<Uuid, AuthUserDetails>) -> EntityView<B>
where
    B: EntityBody,
{
    let auth_user_details = record
        .audit()
        .attribution()
        .auth_user_id
        .and_then(|id| details.get(&id).cloned());
    EntityView {
        record,
        auth_user_details,
    }
}

/// Flat notification body: identity fields followed by the entity body.
fn notification_payload<B: EntityBody>(
    operation: EntityOperation,
    record: &Record<B>,
) -> Result<Value, String> {
    let mut payload = Map::new();
    payload.insert("id".to_owned(), Value::String(record.id().to_string()));
    payload.insert("entity".to_owned(), Value::String(B::TABLE.as_str().to_owned()));
    payload.insert(
        "operation".to_owned(),
        Value::String(operation.as_str().to_owned()),
    );
    if let Some(customer) = record.audit().attribution().auth_customer_id {
        payload.insert("authCustomerId".to_owned(), Value::String(customer.to_string()));
    }
    match serde_json::to_value(record.body()).map_err(|err| err.to_string())? {
        Value::Object(fields) => payload.extend(fields),
        _ => return Err(format!("{} body is not a JSON object", B::TABLE)),
    }
    Ok(Value::Object(payload))
}

/// Why a handler stopped before producing a success envelope.
#[derive(Debug)]
enum HandlerStop {
    Cancelled,
    Failure(HandlerFailure),
}

impl From<Cancelled> for HandlerStop {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<DataError> for HandlerStop {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Cancelled(_) => Self::Cancelled,
            DataError::NotFound { table, id } => {
                Self::Failure(HandlerFailure::NotFound { table, id })
            }
            DataError::Store(err) => Self::Failure(HandlerFailure::Persistence {
                message: err.to_string(),
            }),
            DataError::Codec(err) => Self::Failure(HandlerFailure::Persistence {
                message: err.to_string(),
            }),
        }
    }
}

impl From<RowCodecError> for HandlerStop {
    fn from(err: RowCodecError) -> Self {
        Self::from(DataError::Codec(err))
    }
}

/// Fold a handler outcome into its envelope, letting cancellation through.
fn conclude<R>(
    table: Table,
    operation: EntityOperation,
    outcome: Result<ResultEnvelope<R>, HandlerStop>,
) -> Result<ResultEnvelope<R>, Cancelled> {
    match outcome {
        Ok(envelope) => Ok(envelope),
        Err(HandlerStop::Cancelled) => {
            info!(%table, %operation, "request cancelled");
            Err(Cancelled)
        }
        Err(HandlerStop::Failure(failure)) => {
            warn!(
                %table,
                %operation,
                code = failure.code().as_str(),
                error = %failure,
                "request failed"
            );
            Ok(failure.into_envelope())
        }
    }
}

/// Register the five verb handlers for `B`.
///
/// # Errors
/// Fails when any of `B`'s request types already has a handler.
pub fn register_entity<B: EntityBody>(
    builder: &mut DispatcherBuilder,
    deps: &EntityHandlerDeps,
) -> Result<(), RegistrationError> {
    builder
        .register::<CreateEntity<B>, _>(EntityHandlers::<B>::new(deps.clone()))?
        .register::<GetEntity<B>, _>(EntityHandlers::<B>::new(deps.clone()))?
        .register::<ListEntities<B>, _>(EntityHandlers::<B>::new(deps.clone()))?
        .register::<UpdateEntity<B>, _>(EntityHandlers::<B>::new(deps.clone()))?
        .register::<DeleteEntity<B>, _>(EntityHandlers::<B>::new(deps.clone()))?;
    Ok(())
}

/// Register handlers for every guide table.
///
/// # Errors
/// Fails when any guide request type already has a handler.
pub fn register_guide_entities(
    builder: &mut DispatcherBuilder,
    deps: &EntityHandlerDeps,
) -> Result<(), RegistrationError> {
    register_entity::<Category>(builder, deps)?;
    register_entity::<Business>(builder, deps)?;
    register_entity::<Review>(builder, deps)?;
    register_entity::<Subscription>(builder, deps)?;
    register_entity::<Payment>(builder, deps)?;
    register_entity::<JobPosting>(builder, deps)
}
