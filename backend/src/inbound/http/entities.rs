//! Generic entity endpoints.
//!
//! ```text
//! POST   /api/v1/{segment}
//! GET    /api/v1/{segment}?page=&size=
//! GET    /api/v1/{segment}/{id}
//! PUT    /api/v1/{segment}/{id}
//! DELETE /api/v1/{segment}/{id}
//! ```
//!
//! Each route checks the permission gate, dispatches the typed request and
//! writes the envelope back verbatim. Success maps to 200 (201 for create)
//! and a failed envelope to 400.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Scope, web};
use pagination::PageRequest;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::{ApiResult, HttpError};
use super::identity::GatewayCaller;
use super::state::{DiagnosticsMode, HttpState};
use crate::domain::context::RequestContext;
use crate::domain::dispatcher::Request;
use crate::domain::entities::{Business, Category, JobPosting, Payment, Review, Subscription};
use crate::domain::entity::{EntityBody, EntityOperation};
use crate::domain::handlers::{CreateEntity, DeleteEntity, GetEntity, ListEntities, UpdateEntity};
use crate::domain::ports::PermissionCode;
use crate::domain::ResultEnvelope;

/// Write an envelope with the status its outcome maps to.
pub fn envelope_response<R: Serialize>(
    envelope: ResultEnvelope<R>,
    success: StatusCode,
    diagnostics: DiagnosticsMode,
) -> HttpResponse {
    let status = if envelope.is_success() {
        success
    } else {
        StatusCode::BAD_REQUEST
    };
    let envelope = match diagnostics {
        DiagnosticsMode::Exposed => envelope,
        DiagnosticsMode::Redacted => envelope.redact_diagnostics(),
    };
    HttpResponse::build(status).json(envelope)
}

/// Authorise, dispatch and render one request.
///
/// The cancellation token fires if actix drops the handler future, which it
/// does when the client disconnects.
async fn run<B, R>(
    state: &HttpState,
    caller: GatewayCaller,
    operation: EntityOperation,
    request: R,
    success: StatusCode,
) -> ApiResult<HttpResponse>
where
    B: EntityBody,
    R: Request,
    R::Response: Serialize,
{
    let caller = caller.into_inner();
    state
        .permissions
        .authorize(&caller, &PermissionCode::for_entity(B::TABLE, operation))?;
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();
    let context = RequestContext::new(caller, token);
    let envelope = state.dispatcher.send(request, &context).await?;
    Ok(envelope_response(envelope, success, state.diagnostics))
}

async fn create_entity<B: EntityBody>(
    state: web::Data<HttpState>,
    caller: GatewayCaller,
    body: web::Json<B>,
) -> ApiResult<HttpResponse> {
    let request = CreateEntity::new(body.into_inner());
    run::<B, _>(&state, caller, EntityOperation::Create, request, StatusCode::CREATED).await
}

async fn list_entities<B: EntityBody>(
    state: web::Data<HttpState>,
    caller: GatewayCaller,
    page: web::Query<PageRequest>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::bounded(page.page(), page.size())
        .map_err(|err| HttpError::invalid_request(format!("query string is invalid: {err}")))?;
    let request = ListEntities::<B>::new(page);
    run::<B, _>(&state, caller, EntityOperation::List, request, StatusCode::OK).await
}

async fn get_entity<B: EntityBody>(
    state: web::Data<HttpState>,
    caller: GatewayCaller,
    id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let request = GetEntity::<B>::new(id.into_inner());
    run::<B, _>(&state, caller, EntityOperation::Read, request, StatusCode::OK).await
}

async fn update_entity<B: EntityBody>(
    state: web::Data<HttpState>,
    caller: GatewayCaller,
    id: web::Path<Uuid>,
    body: web::Json<B>,
) -> ApiResult<HttpResponse> {
    let request = UpdateEntity::new(id.into_inner(), body.into_inner());
    run::<B, _>(&state, caller, EntityOperation::Update, request, StatusCode::OK).await
}

async fn delete_entity<B: EntityBody>(
    state: web::Data<HttpState>,
    caller: GatewayCaller,
    id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let request = DeleteEntity::<B>::new(id.into_inner());
    run::<B, _>(&state, caller, EntityOperation::Delete, request, StatusCode::OK).await
}

/// The five routes for `B`, mounted under its route segment.
pub fn entity_scope<B: EntityBody>() -> Scope {
    web::scope(&format!("/{}", B::TABLE.route_segment()))
        .route("", web::post().to(create_entity::<B>))
        .route("", web::get().to(list_entities::<B>))
        .route("/{id}", web::get().to(get_entity::<B>))
        .route("/{id}", web::put().to(update_entity::<B>))
        .route("/{id}", web::delete().to(delete_entity::<B>))
}

/// Body and query extraction failures become 400 envelopes.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        HttpError::invalid_request(format!("request body is invalid: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        HttpError::invalid_request(format!("query string is invalid: {err}")).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        HttpError::invalid_request(format!("path is invalid: {err}")).into()
    }));
}

/// The `/api/v1` scope with every guide table mounted.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .configure(configure_extractors)
        .service(entity_scope::<Category>())
        .service(entity_scope::<Business>())
        .service(entity_scope::<Review>())
        .service(entity_scope::<Subscription>())
        .service(entity_scope::<Payment>())
        .service(entity_scope::<JobPosting>())
}
