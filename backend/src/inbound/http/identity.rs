//! Caller identity supplied by the trusted gateway.
//!
//! The gateway authenticates the caller and forwards the result as headers.
//! Absent headers narrow nothing: a missing user id simply disables the user
//! filter. A header that is present but unreadable is rejected instead, since
//! dropping it would widen the caller's auth scope.

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::error::HttpError;
use crate::domain::context::CallerIdentity;

pub const USER_ID_HEADER: &str = "x-auth-user-id";
pub const CUSTOMER_ID_HEADER: &str = "x-auth-customer-id";
pub const ROLES_HEADER: &str = "x-auth-roles";

/// Identity header the gateway sent in an unusable form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity header {header} is not valid text")]
    NotText { header: &'static str },
    #[error("identity header {header} is not a UUID")]
    NotUuid { header: &'static str },
}

/// Extractor resolving the gateway headers into a [`CallerIdentity`].
#[derive(Debug, Clone)]
pub struct GatewayCaller(pub CallerIdentity);

impl GatewayCaller {
    pub fn into_inner(self) -> CallerIdentity {
        self.0
    }
}

fn header_text<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<Option<&'a str>, IdentityError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| IdentityError::NotText { header: name })?;
    Ok(Some(text.trim()).filter(|text| !text.is_empty()))
}

fn header_uuid(headers: &HeaderMap, name: &'static str) -> Result<Option<Uuid>, IdentityError> {
    header_text(headers, name)?
        .map(|text| Uuid::parse_str(text).map_err(|_| IdentityError::NotUuid { header: name }))
        .transpose()
}

/// Resolve the caller from request headers.
///
/// # Errors
/// Fails when an identity header is present but not valid text, or when an
/// id header does not hold a UUID.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<CallerIdentity, IdentityError> {
    let mut caller = CallerIdentity::anonymous();
    if let Some(user_id) = header_uuid(headers, USER_ID_HEADER)? {
        caller = caller.with_user(user_id);
    }
    if let Some(customer_id) = header_uuid(headers, CUSTOMER_ID_HEADER)? {
        caller = caller.with_customer(customer_id);
    }
    if let Some(roles) = header_text(headers, ROLES_HEADER)? {
        caller = caller.with_roles(
            roles
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty()),
        );
    }
    Ok(caller)
}

impl FromRequest for GatewayCaller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_from_headers(req.headers()).map(Self).map_err(|err| {
            warn!(error = %err, "rejecting request with malformed identity");
            actix_web::Error::from(HttpError::invalid_request(err.to_string()))
        }))
    }
}
