//! Read-by-id handler.

use async_trait::async_trait;
use uuid::Uuid;

use super::{EntityHandlers, EntityView, GetEntity, HandlerStop, conclude, view_of};
use crate::domain::context::{Cancelled, RequestContext};
use crate::domain::dispatcher::RequestHandler;
use crate::domain::entity::{EntityBody, EntityOperation};
use crate::domain::envelope::ResultEnvelope;

#[async_trait]
impl<B: EntityBody> RequestHandler<GetEntity<B>> for EntityHandlers<B> {
    async fn handle(
        &self,
        request: GetEntity<B>,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<EntityView<B>>, Cancelled> {
        let outcome = self.get(request.id, context).await;
        conclude(B::TABLE, EntityOperation::Read, outcome)
    }
}

impl<B: EntityBody> EntityHandlers<B> {
    async fn get(
        &self,
        id: Uuid,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<EntityView<B>>, HandlerStop> {
        let record = self.load_visible(id, context).await?;
        let details = self
            .owner_details(std::slice::from_ref(&record), context)
            .await?;
        Ok(ResultEnvelope::success(view_of(record, &details)))
    }
}
