//! Typed request routing.
//!
//! Every request type names its response type through [`Request`] and has
//! exactly one [`RequestHandler`]. Handlers are registered on a
//! [`DispatcherBuilder`] at startup; registering a second handler for the
//! same request type is a configuration error. The built [`Dispatcher`] is
//! immutable and cheap to clone into every worker.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{Instrument, debug, error, field, info_span};

use super::context::{Cancelled, RequestContext};
use super::envelope::ResultEnvelope;
use super::trace_id::TraceId;

/// A message with a single response type.
pub trait Request: Send + 'static {
    /// Payload of a successful envelope.
    type Response: Send + 'static;
}

/// Business logic for one request type.
///
/// Handlers convert every domain failure into a failed envelope. The only
/// error they return is [`Cancelled`], when the caller went away before the
/// work finished.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: R,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<R::Response>, Cancelled>;
}

/// Startup configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("a handler for {request_type} is already registered")]
    Duplicate { request_type: &'static str },
}

/// Errors raised while routing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no handler registered for {request_type}")]
    Unregistered { request_type: &'static str },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

type ErasedHandler = Box<dyn Any + Send + Sync>;

/// Collects handlers before the dispatcher is frozen.
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<TypeId, ErasedHandler>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `R`.
    ///
    /// # Errors
    /// Returns [`RegistrationError::Duplicate`] when `R` already has one.
    pub fn register<R, H>(&mut self, handler: H) -> Result<&mut Self, RegistrationError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let request_type = type_name::<R>();
        match self.handlers.entry(TypeId::of::<R>()) {
            Entry::Occupied(_) => {
                error!(request_type, "duplicate handler registration");
                Err(RegistrationError::Duplicate { request_type })
            }
            Entry::Vacant(slot) => {
                let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
                slot.insert(Box::new(handler));
                debug!(request_type, "handler registered");
                Ok(self)
            }
        }
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            handlers: Arc::new(self.handlers),
        }
    }
}

/// Routes requests to their registered handler.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HashMap<TypeId, ErasedHandler>>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Whether a handler exists for `R`.
    pub fn handles<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    /// Run the handler registered for `R`.
    ///
    /// # Errors
    /// [`DispatchError::Unregistered`] when no handler exists for `R`, or
    /// [`DispatchError::Cancelled`] when the handler observed cancellation.
    pub async fn send<R: Request>(
        &self,
        request: R,
        context: &RequestContext,
    ) -> Result<ResultEnvelope<R::Response>, DispatchError> {
        let request_type = type_name::<R>();
        let handler = self
            .handlers
            .get(&TypeId::of::<R>())
            .and_then(|erased| erased.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .cloned()
            .ok_or_else(|| {
                error!(request_type, "no handler registered");
                DispatchError::Unregistered { request_type }
            })?;

        let span = info_span!("dispatch", request_type, trace_id = field::Empty);
        if let Some(trace_id) = TraceId::current() {
            span.record("trace_id", field::display(trace_id));
        }
        let envelope = handler.handle(request, context).instrument(span).await?;
        debug!(
            request_type,
            operation_status = envelope.is_success(),
            "request dispatched"
        );
        Ok(envelope)
    }
}
