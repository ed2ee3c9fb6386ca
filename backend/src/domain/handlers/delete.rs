//! Soft-delete handler.
//!
//! The handler queues a removal; the audit stamp turns it into an update
//! that clears `rowIsActive` and sets `rowIsDeleted`. When two deletes race,
//! the store rejects the second commit because its target is no longer live,
//! and the caller receives a not-found envelope.

use async_trait::async_trait;
use uuid::Uuid;

use super::{DeleteEntity, DeletedEntity, EntityHandlers, HandlerStop, conclude};
use crate::domain::context::{Cancelled, RequestContext};
use crate::domain::data_context::UnitOfWork;
use crate::domain::dispatcher::RequestHandler;
use crate::domain::entity::{EntityBody, EntityOperation};
use crate::domain::envelope::{ResultEnvelope, SUCCESS_TITLE};

#[async_trait]
impl<B: EntityBody> RequestHandler<DeleteEntity<B>> for EntityHandlers<B> {
    async fn handle(
        &self,
        request: DeleteEntity<B>,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<DeletedEntity>, Cancelled> {
        let outcome = self.delete(request.id, context).await;
        conclude(B::TABLE, EntityOperation::Delete, outcome)
    }
}

impl<B: EntityBody> EntityHandlers<B> {
    async fn delete(
        &self,
        id: Uuid,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<DeletedEntity>, HandlerStop> {
        let mut record = self.load_visible(id, context).await?;
        record.attribution_mut().update_user_id = context.caller().user_id();

        let mut work = UnitOfWork::new();
        work.remove(&record)?;
        let removed = self.commit_one(work, id, context).await?;
        self.notify(EntityOperation::Delete, &removed, context).await?;

        Ok(ResultEnvelope::success_with(
            DeletedEntity {
                id,
                entity: B::TABLE,
            },
            SUCCESS_TITLE,
            format!("{} deleted.", B::TABLE.label()),
        ))
    }
}
