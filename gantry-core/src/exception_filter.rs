//! Exception filters
//!
//! Filters map any pipeline failure to the single outcome handed to the
//! response sink. Registration works against failure kinds: the most
//! specific registered filter whose declared kinds match the failure wins,
//! and a built-in default mapping covers everything else with a safe,
//! kind-derived detail payload.
//!
//! Filters are pure with respect to pipeline state: they read the failure
//! and the exception context, and they never re-enter guards, pipes, or
//! interceptors.

use crate::context::RequestContext;
use crate::error::{Error, ErrorKind};
use crate::logging::{debug, warn};
use crate::outcome::Outcome;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Exception Context
// ============================================================================

/// Context information passed to exception filters.
#[derive(Debug, Clone)]
pub struct ExceptionContext {
    /// The HTTP method of the failing request
    pub method: String,
    /// The path that was being accessed
    pub path: String,
    /// Request ID for tracing
    pub request_id: String,
}

impl ExceptionContext {
    /// Create an exception context from the request context.
    pub fn from_request(request: &RequestContext) -> Self {
        Self {
            method: request.method.clone(),
            path: request.path.clone(),
            request_id: request.request_id.clone(),
        }
    }
}

// ============================================================================
// Exception Filter Trait
// ============================================================================

/// Trait for exception filters that map failures to outcomes.
///
/// Return `Ok(Some(outcome))` to handle the failure, `Ok(None)` to pass it
/// to the next filter in the chain. A filter that fails never surfaces its
/// own error; the chain falls back to the internal default outcome.
#[async_trait]
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch and map a failure.
    async fn catch(&self, error: &Error, ctx: &ExceptionContext)
        -> Result<Option<Outcome>, Error>;

    /// Get the failure kinds this filter handles.
    ///
    /// Return `None` to be offered every failure, or `Some(vec![...])` to
    /// only be offered the listed kinds.
    fn handles(&self) -> Option<Vec<ErrorKind>> {
        None
    }

    /// Get the filter's priority (higher = earlier in chain).
    fn priority(&self) -> i32 {
        0
    }

    /// Get the filter's name for debugging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// Exception Filter Chain
// ============================================================================

/// An ordered chain of exception filters.
///
/// Selection is deterministic: filters are sorted by descending priority
/// (registration order stable within a priority), and the first matching
/// filter that returns an outcome wins.
pub struct ExceptionFilterChain {
    filters: Vec<Arc<dyn ExceptionFilter>>,
}

impl ExceptionFilterChain {
    /// Create a new empty filter chain.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the chain.
    pub fn add_filter<F: ExceptionFilter>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self.filters
            .sort_by_key(|f| std::cmp::Reverse(f.priority()));
        self
    }

    /// Add a filter as Arc.
    pub fn add_filter_arc(mut self, filter: Arc<dyn ExceptionFilter>) -> Self {
        self.filters.push(filter);
        self.filters
            .sort_by_key(|f| std::cmp::Reverse(f.priority()));
        self
    }

    /// Map a failure through the chain; exactly one outcome comes back.
    pub async fn handle(&self, error: &Error, ctx: &ExceptionContext) -> Outcome {
        let kind = error.kind();

        for filter in &self.filters {
            // Skip filters scoped to other kinds
            if let Some(handled) = filter.handles()
                && !handled.contains(&kind)
            {
                continue;
            }

            match filter.catch(error, ctx).await {
                Ok(Some(outcome)) => {
                    debug!(
                        filter = filter.name(),
                        kind = kind.as_str(),
                        "Exception caught by filter"
                    );
                    return outcome;
                }
                Ok(None) => continue,
                Err(filter_error) => {
                    warn!(
                        filter = filter.name(),
                        error = %filter_error,
                        "Exception filter failed, using internal fallback"
                    );
                    return internal_fallback();
                }
            }
        }

        debug!(
            kind = kind.as_str(),
            "No filter caught exception, using default mapping"
        );
        default_outcome(error)
    }
}

impl Default for ExceptionFilterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ExceptionFilterChain {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

/// Safe default mapping: the failure's kind and status hint with a generic
/// detail payload. Raw internal detail never passes through here.
fn default_outcome(error: &Error) -> Outcome {
    let kind = error.kind();
    Outcome::failure(
        kind,
        json!({ "message": kind.safe_message() }),
        kind.status_hint(),
    )
}

/// Fallback used when a filter itself fails.
fn internal_fallback() -> Outcome {
    Outcome::failure(
        ErrorKind::Internal,
        json!({ "message": ErrorKind::Internal.safe_message() }),
        ErrorKind::Internal.status_hint(),
    )
}

// ============================================================================
// Built-in Exception Filters
// ============================================================================

/// Validation filter: surfaces the field-level violations collected by the
/// failing pipe.
pub struct ValidationExceptionFilter;

#[async_trait]
impl ExceptionFilter for ValidationExceptionFilter {
    async fn catch(
        &self,
        error: &Error,
        _ctx: &ExceptionContext,
    ) -> Result<Option<Outcome>, Error> {
        if let Error::Validation(failure) = error {
            return Ok(Some(Outcome::failure(
                ErrorKind::Validation,
                failure.to_json(),
                ErrorKind::Validation.status_hint(),
            )));
        }
        Ok(None)
    }

    fn handles(&self) -> Option<Vec<ErrorKind>> {
        Some(vec![ErrorKind::Validation])
    }

    fn priority(&self) -> i32 {
        100
    }

    fn name(&self) -> &str {
        "ValidationExceptionFilter"
    }
}

/// Access filter: forwards the guard-written message for authorization
/// failures.
pub struct AccessExceptionFilter;

#[async_trait]
impl ExceptionFilter for AccessExceptionFilter {
    async fn catch(
        &self,
        error: &Error,
        _ctx: &ExceptionContext,
    ) -> Result<Option<Outcome>, Error> {
        match error {
            Error::Unauthorized(message) | Error::Forbidden(message) => {
                Ok(Some(Outcome::failure(
                    error.kind(),
                    json!({ "message": message }),
                    error.status_code(),
                )))
            }
            _ => Ok(None),
        }
    }

    fn handles(&self) -> Option<Vec<ErrorKind>> {
        Some(vec![ErrorKind::Unauthorized, ErrorKind::Forbidden])
    }

    fn priority(&self) -> i32 {
        50
    }

    fn name(&self) -> &str {
        "AccessExceptionFilter"
    }
}

/// A catch-all filter applying the safe default mapping to every failure.
pub struct AllExceptionsFilter;

#[async_trait]
impl ExceptionFilter for AllExceptionsFilter {
    async fn catch(
        &self,
        error: &Error,
        _ctx: &ExceptionContext,
    ) -> Result<Option<Outcome>, Error> {
        Ok(Some(default_outcome(error)))
    }

    fn priority(&self) -> i32 {
        -1000 // Very low priority - should be last
    }

    fn name(&self) -> &str {
        "AllExceptionsFilter"
    }
}

/// A function-based exception filter for simple cases.
pub struct FnExceptionFilter<F>
where
    F: Fn(&Error, &ExceptionContext) -> Option<Outcome> + Send + Sync + 'static,
{
    handler: F,
    kinds: Option<Vec<ErrorKind>>,
    priority: i32,
    name: String,
}

impl<F> FnExceptionFilter<F>
where
    F: Fn(&Error, &ExceptionContext) -> Option<Outcome> + Send + Sync + 'static,
{
    /// Create a new function-based filter.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            kinds: None,
            priority: 0,
            name: "FnExceptionFilter".to_string(),
        }
    }

    /// Set the failure kinds to handle.
    pub fn handles(mut self, kinds: Vec<ErrorKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<F> ExceptionFilter for FnExceptionFilter<F>
where
    F: Fn(&Error, &ExceptionContext) -> Option<Outcome> + Send + Sync + 'static,
{
    async fn catch(
        &self,
        error: &Error,
        ctx: &ExceptionContext,
    ) -> Result<Option<Outcome>, Error> {
        Ok((self.handler)(error, ctx))
    }

    fn handles(&self) -> Option<Vec<ErrorKind>> {
        self.kinds.clone()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Presets
// ============================================================================

impl ExceptionFilterChain {
    /// Create a production filter chain (safe errors).
    pub fn production() -> Self {
        Self::new()
            .add_filter(ValidationExceptionFilter)
            .add_filter(AccessExceptionFilter)
            .add_filter(AllExceptionsFilter)
    }

    /// Create a development filter chain: violations surface, everything
    /// else takes the default mapping.
    pub fn development() -> Self {
        Self::new().add_filter(ValidationExceptionFilter)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldViolation, ValidationFailure};

    fn ctx() -> ExceptionContext {
        ExceptionContext::from_request(&RequestContext::new("GET", "/cats"))
    }

    #[tokio::test]
    async fn test_exception_context_from_request() {
        let request = RequestContext::new("POST", "/cats");
        let ctx = ExceptionContext::from_request(&request);

        assert_eq!(ctx.method, "POST");
        assert_eq!(ctx.path, "/cats");
        assert_eq!(ctx.request_id, request.request_id);
    }

    #[tokio::test]
    async fn test_validation_filter_surfaces_violations() {
        let error = Error::Validation(ValidationFailure::of(FieldViolation::new(
            "age",
            "expected an integer",
        )));

        let outcome = ValidationExceptionFilter
            .catch(&error, &ctx())
            .await
            .unwrap()
            .unwrap();

        match outcome {
            Outcome::Failure {
                kind,
                detail,
                status,
            } => {
                assert_eq!(kind, ErrorKind::Validation);
                assert_eq!(status, 400);
                assert_eq!(detail["violations"][0]["field"], "age");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validation_filter_ignores_other_kinds() {
        let error = Error::Internal("boom".to_string());
        let result = ValidationExceptionFilter.catch(&error, &ctx()).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_chain_selection_is_deterministic() {
        let chain = ExceptionFilterChain::new()
            .add_filter(AllExceptionsFilter)
            .add_filter(ValidationExceptionFilter);

        // The kind-scoped filter always wins over the catch-all
        for _ in 0..5 {
            let error = Error::validation("id", "bad");
            let outcome = chain.handle(&error, &ctx()).await;
            match outcome {
                Outcome::Failure { detail, status, .. } => {
                    assert_eq!(status, 400);
                    assert!(detail.get("violations").is_some());
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_default_mapping_hides_raw_detail() {
        let chain = ExceptionFilterChain::new();
        let error = Error::Internal("password for root is hunter2".to_string());

        let outcome = chain.handle(&error, &ctx()).await;
        match outcome {
            Outcome::Failure { detail, status, .. } => {
                assert_eq!(status, 500);
                assert!(!detail.to_string().contains("hunter2"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_keeps_status_hint_through_default_mapping() {
        let chain = ExceptionFilterChain::production();
        let error = Error::Upstream("upstream handler failed".to_string());

        let outcome = chain.handle(&error, &ctx()).await;
        assert_eq!(outcome.status(), 502);
    }

    #[tokio::test]
    async fn test_failing_filter_falls_back_to_internal() {
        struct BrokenFilter;

        #[async_trait]
        impl ExceptionFilter for BrokenFilter {
            async fn catch(
                &self,
                _error: &Error,
                _ctx: &ExceptionContext,
            ) -> Result<Option<Outcome>, Error> {
                Err(Error::Internal("filter exploded".to_string()))
            }

            fn priority(&self) -> i32 {
                100
            }
        }

        let chain = ExceptionFilterChain::new()
            .add_filter(BrokenFilter)
            .add_filter(AllExceptionsFilter);

        let error = Error::Forbidden("nope".to_string());
        let outcome = chain.handle(&error, &ctx()).await;

        match outcome {
            Outcome::Failure { kind, status, .. } => {
                assert_eq!(kind, ErrorKind::Internal);
                assert_eq!(status, 500);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fn_exception_filter() {
        let filter = FnExceptionFilter::new(|error, _ctx| {
            if let Error::NotFound(_) = error {
                Some(Outcome::failure(
                    ErrorKind::NotFound,
                    json!({"message": "gone"}),
                    404,
                ))
            } else {
                None
            }
        })
        .handles(vec![ErrorKind::NotFound])
        .with_priority(10)
        .with_name("NotFoundFilter");

        assert_eq!(filter.priority(), 10);
        assert_eq!(filter.name(), "NotFoundFilter");

        let outcome = filter
            .catch(&Error::NotFound("cat 7".to_string()), &ctx())
            .await
            .unwrap();
        assert!(outcome.is_some());
    }

    #[tokio::test]
    async fn test_access_filter_forwards_message() {
        let error = Error::Forbidden("role admin required".to_string());
        let outcome = AccessExceptionFilter
            .catch(&error, &ctx())
            .await
            .unwrap()
            .unwrap();

        match outcome {
            Outcome::Failure { detail, status, .. } => {
                assert_eq!(status, 403);
                assert_eq!(detail["message"], "role admin required");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_preset_chains() {
        let production = ExceptionFilterChain::production();
        let development = ExceptionFilterChain::development();

        let error = Error::Timeout("handler exceeded 50ms".to_string());
        assert_eq!(production.handle(&error, &ctx()).await.status(), 504);
        assert_eq!(development.handle(&error, &ctx()).await.status(), 504);
    }
}
