//! Per-request caller identity and cancellation.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::query::AuthScope;

/// The authenticated caller as reported by the identity gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    user_id: Option<Uuid>,
    customer_id: Option<Uuid>,
    roles: Vec<String>,
}

impl CallerIdentity {
    /// Anonymous caller with no roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_customer(mut self, customer_id: Uuid) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn customer_id(&self) -> Option<Uuid> {
        self.customer_id
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Filters applied to every read the caller performs.
    pub fn auth_scope(&self) -> AuthScope {
        AuthScope {
            user_id: self.user_id,
            customer_id: self.customer_id,
        }
    }
}

/// Raised when the caller abandoned the request before it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request was cancelled")]
pub struct Cancelled;

/// Everything a handler knows about the invocation besides the request value.
#[derive(Debug, Clone)]
pub struct RequestContext {
    caller: CallerIdentity,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(caller: CallerIdentity, cancellation: CancellationToken) -> Self {
        Self {
            caller,
            cancellation,
        }
    }

    /// Context with a token nobody else holds, for background work and tests.
    pub fn detached(caller: CallerIdentity) -> Self {
        Self::new(caller, CancellationToken::new())
    }

    pub fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Race `fut` against cancellation of this request.
    ///
    /// # Errors
    /// Returns [`Cancelled`] when the token fires first.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        cancellable(&self.cancellation, fut).await
    }
}

/// Race `fut` against `token`.
///
/// # Errors
/// Returns [`Cancelled`] when the token fires first. An already cancelled
/// token wins even if `fut` is immediately ready.
pub async fn cancellable<F>(token: &CancellationToken, fut: F) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(Cancelled),
        output = fut => Ok(output),
    }
}
