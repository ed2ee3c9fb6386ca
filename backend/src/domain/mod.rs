//! Transport-agnostic core of the guide backend.
//!
//! - [`envelope`]: the result wrapper every operation returns.
//! - [`audit`]: audit columns and the pre-commit stamp.
//! - [`entity`] and [`entities`]: row shapes and the six guide tables.
//! - [`query`]: auth-scoped filtering, paging and owner lookup.
//! - [`data_context`]: typed reads and the single commit path.
//! - [`dispatcher`] and [`handlers`]: typed request routing and the generic
//!   verb handlers.
//! - [`ports`]: traits implemented by outbound adapters.

pub mod audit;
pub mod context;
pub mod data_context;
pub mod dispatcher;
pub mod entities;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod messaging;
pub mod permissions;
pub mod ports;
pub mod query;
pub mod trace_id;

pub use self::audit::{Attribution, AuditFields, StampedChangeSet, stamp};
pub use self::context::{CallerIdentity, Cancelled, RequestContext};
pub use self::data_context::{CommitReceipt, DataContext, DataError, UnitOfWork};
pub use self::dispatcher::{
    DispatchError, Dispatcher, DispatcherBuilder, RegistrationError, Request, RequestHandler,
};
pub use self::entities::{Business, Category, JobPosting, Payment, Review, Subscription};
pub use self::entity::{EntityBody, EntityOperation, OwnerField, OwnerScoped, Record, Table};
pub use self::envelope::ResultEnvelope;
pub use self::error::{ErrorCode, HandlerFailure};
pub use self::handlers::{
    CreateEntity, DeleteEntity, DeletedEntity, EntityHandlerDeps, EntityView, GetEntity,
    ListEntities, UpdateEntity, register_entity, register_guide_entities,
};
pub use self::messaging::QueueName;
pub use self::permissions::{PermissionMapError, PermissionsNotEnforced, RolePermissionGate};
pub use self::query::{AuthScope, apply_auth_filters, apply_pagination, get_auth_user_details};
pub use self::trace_id::TraceId;
