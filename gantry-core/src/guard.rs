// Guards for route protection

use crate::context::{Principal, RequestContext};
use crate::Error;
use async_trait::async_trait;
use std::sync::Arc;

/// Execution context for guards.
///
/// Carries the shared request context together with the route's declared
/// authorization requirement, looked up by the dispatcher at dispatch time.
pub struct GuardContext {
    request: Arc<RequestContext>,
    required_roles: Vec<String>,
}

impl GuardContext {
    pub fn new(request: Arc<RequestContext>, required_roles: Vec<String>) -> Self {
        Self {
            request,
            required_roles,
        }
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Roles the current route declares, empty when it declares none.
    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn param(&self, name: &str) -> Option<&String> {
        self.request.param(name)
    }

    pub fn principal(&self) -> Option<Principal> {
        self.request.principal()
    }

    pub fn set_principal(&self, principal: &Principal) {
        self.request.set_principal(principal);
    }
}

/// Guard trait for protecting routes.
///
/// Guards may only mutate the request metadata; they never touch state
/// outside the current request.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Determine if the request can proceed
    async fn can_activate(&self, context: &GuardContext) -> Result<bool, Error>;
}

/// Role-based guard.
///
/// Reads the route's declared role requirement from the guard context and
/// matches it against the principal attached to the request metadata.
pub struct RolesGuard;

#[async_trait]
impl Guard for RolesGuard {
    async fn can_activate(&self, context: &GuardContext) -> Result<bool, Error> {
        // Routes without a declared requirement are open by default
        if context.required_roles().is_empty() {
            return Ok(true);
        }

        let principal = context.principal().ok_or_else(|| {
            Error::Unauthorized("no principal attached to the request".to_string())
        })?;

        Ok(context
            .required_roles()
            .iter()
            .any(|role| principal.has_role(role)))
    }
}

/// Authentication guard.
///
/// Reads a bearer credential from the `authorization` request parameter,
/// resolves it to a principal, and attaches that principal to the request
/// metadata for later stages and the handler.
pub struct AuthenticationGuard<R>
where
    R: Fn(&str) -> Option<Principal> + Send + Sync,
{
    resolver: R,
}

impl<R> AuthenticationGuard<R>
where
    R: Fn(&str) -> Option<Principal> + Send + Sync,
{
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl<R> Guard for AuthenticationGuard<R>
where
    R: Fn(&str) -> Option<Principal> + Send + Sync,
{
    async fn can_activate(&self, context: &GuardContext) -> Result<bool, Error> {
        let credential = context.param("authorization").ok_or_else(|| {
            Error::Unauthorized("missing authorization credential".to_string())
        })?;

        let token = credential.strip_prefix("Bearer ").ok_or_else(|| {
            Error::Unauthorized("invalid authorization credential".to_string())
        })?;

        let principal = (self.resolver)(token)
            .ok_or_else(|| Error::Unauthorized("unknown credential".to_string()))?;

        context.set_principal(&principal);
        Ok(true)
    }
}

/// Custom guard built from a predicate.
pub struct FnGuard<F>
where
    F: Fn(&GuardContext) -> Result<bool, Error> + Send + Sync,
{
    predicate: F,
}

impl<F> FnGuard<F>
where
    F: Fn(&GuardContext) -> Result<bool, Error> + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

#[async_trait]
impl<F> Guard for FnGuard<F>
where
    F: Fn(&GuardContext) -> Result<bool, Error> + Send + Sync,
{
    async fn can_activate(&self, context: &GuardContext) -> Result<bool, Error> {
        (self.predicate)(context)
    }
}
