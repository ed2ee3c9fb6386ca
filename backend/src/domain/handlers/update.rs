//! Update handler.

use async_trait::async_trait;
use uuid::Uuid;

use super::{EntityHandlers, EntityView, HandlerStop, UpdateEntity, conclude};
use crate::domain::context::{Cancelled, RequestContext};
use crate::domain::data_context::UnitOfWork;
use crate::domain::dispatcher::RequestHandler;
use crate::domain::entity::{EntityBody, EntityOperation};
use crate::domain::envelope::{ResultEnvelope, SUCCESS_TITLE};

#[async_trait]
impl<B: EntityBody> RequestHandler<UpdateEntity<B>> for EntityHandlers<B> {
    async fn handle(
        &self,
        request: UpdateEntity<B>,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<EntityView<B>>, Cancelled> {
        let outcome = self.update(request.id, request.body, context).await;
        conclude(B::TABLE, EntityOperation::Update, outcome)
    }
}

impl<B: EntityBody> EntityHandlers<B> {
    /// Replace the body of a visible live row. Ownership columns are kept.
    async fn update(
        &self,
        id: Uuid,
        body: B,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<EntityView<B>>, HandlerStop> {
        let mut record = self.load_visible(id, context).await?;
        record.replace_body(body);
        record.attribution_mut().update_user_id = context.caller().user_id();

        let mut work = UnitOfWork::new();
        work.modify(&record)?;
        let saved = self.commit_one(work, id, context).await?;
        self.notify(EntityOperation::Update, &saved, context).await?;

        let view = self.view_after_write(saved, context).await?;
        Ok(ResultEnvelope::success_with(
            view,
            SUCCESS_TITLE,
            format!("{} updated.", B::TABLE.label()),
        ))
    }
}
