//! Paged list handler.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use super::{EntityHandlers, EntityView, HandlerStop, ListEntities, conclude, view_of};
use crate::domain::context::{Cancelled, RequestContext};
use crate::domain::dispatcher::RequestHandler;
use crate::domain::entity::{EntityBody, EntityOperation};
use crate::domain::envelope::ResultEnvelope;
use crate::domain::query::apply_auth_filters;

#[async_trait]
impl<B: EntityBody> RequestHandler<ListEntities<B>> for EntityHandlers<B> {
    async fn handle(
        &self,
        request: ListEntities<B>,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<Page<EntityView<B>>>, Cancelled> {
        let outcome = self.list(request.page, context).await;
        conclude(B::TABLE, EntityOperation::List, outcome)
    }
}

impl<B: EntityBody> EntityHandlers<B> {
    /// Live rows visible to the caller, oldest first, one page at a time.
    async fn list(
        &self,
        page: PageRequest,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<Page<EntityView<B>>>, HandlerStop> {
        let scope = context.caller().auth_scope();
        let records = self.deps.data.list::<B>(&scope, context.cancellation()).await?;
        let selected = page.paginate(apply_auth_filters(records, &scope));
        let details = self.owner_details(selected.items(), context).await?;
        Ok(ResultEnvelope::success(
            selected.map(|record| view_of(record, &details)),
        ))
    }
}
