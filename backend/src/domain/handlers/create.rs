//! Create handler.

use async_trait::async_trait;
use uuid::Uuid;

use super::{CreateEntity, EntityHandlers, EntityView, HandlerStop, conclude};
use crate::domain::context::{Cancelled, RequestContext};
use crate::domain::data_context::UnitOfWork;
use crate::domain::dispatcher::RequestHandler;
use crate::domain::entity::{EntityBody, EntityOperation, Record};
use crate::domain::envelope::{ResultEnvelope, SUCCESS_TITLE};

#[async_trait]
impl<B: EntityBody> RequestHandler<CreateEntity<B>> for EntityHandlers<B> {
    async fn handle(
        &self,
        request: CreateEntity<B>,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<EntityView<B>>, Cancelled> {
        let outcome = self.create(request.body, context).await;
        conclude(B::TABLE, EntityOperation::Create, outcome)
    }
}

impl<B: EntityBody> EntityHandlers<B> {
    async fn create(
        &self,
        body: B,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<EntityView<B>>, HandlerStop> {
        let caller = context.caller();
        let mut record = Record::new(Uuid::new_v4(), body);
        let attribution = record.attribution_mut();
        attribution.create_user_id = caller.user_id();
        attribution.update_user_id = caller.user_id();
        attribution.auth_user_id = caller.user_id();
        attribution.auth_customer_id = caller.customer_id();

        let mut work = UnitOfWork::new();
        work.add(&record)?;
        let saved = self.commit_one(work, record.id(), context).await?;
        self.notify(EntityOperation::Create, &saved, context).await?;

        let view = self.view_after_write(saved, context).await?;
        Ok(ResultEnvelope::success_with(
            view,
            SUCCESS_TITLE,
            format!("{} created.", B::TABLE.label()),
        ))
    }
}
