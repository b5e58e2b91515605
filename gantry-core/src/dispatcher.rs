// Dispatcher: drives the full stage sequence for one request

use crate::context::RequestContext;
use crate::error::{Error, FieldViolation, ValidationFailure};
use crate::exception_filter::{ExceptionContext, ExceptionFilterChain};
use crate::guard::{Guard, GuardContext};
use crate::interceptor::{Interceptor, InterceptorChain, Next};
use crate::logging::debug;
use crate::outcome::Outcome;
use crate::pipe::ParamMeta;
use crate::route::{ParamSource, RouteDescriptor, RouteTable};
use crate::timeout::TimeoutConfig;
use serde_json::Value;
use std::sync::Arc;

/// Composes the guard chain, pipe chain, interceptor onion, and exception
/// filters into one execution per request.
///
/// Built from passed-in stage lists and a route table; the table supplies
/// each route's local stages, declared requirements, and handler, and is
/// only read here. Global stages run before route-local stages, and global
/// interceptors wrap route-local ones, which wrap the handler. Exactly one
/// outcome is produced per dispatch, and any stage failure is routed
/// through the filter chain exactly once.
pub struct Dispatcher {
    routes: RouteTable,
    global_guards: Vec<Arc<dyn Guard>>,
    global_interceptors: Vec<Arc<dyn Interceptor>>,
    filters: ExceptionFilterChain,
    timeouts: TimeoutConfig,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            global_guards: Vec::new(),
            global_interceptors: Vec::new(),
            filters: ExceptionFilterChain::production(),
            timeouts: TimeoutConfig::new(),
        }
    }

    /// Register a route descriptor.
    pub fn route(mut self, descriptor: RouteDescriptor) -> Self {
        self.routes.register(descriptor);
        self
    }

    /// Add a global guard; global guards run before route-local guards.
    pub fn use_global_guard<G: Guard + 'static>(mut self, guard: G) -> Self {
        self.global_guards.push(Arc::new(guard));
        self
    }

    /// Add a global interceptor; global interceptors wrap route-local ones.
    pub fn use_global_interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.global_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Replace the exception filter chain.
    pub fn with_filters(mut self, filters: ExceptionFilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Set the handler timeout policy.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Execute the full pipeline for one inbound request.
    pub async fn dispatch(&self, request: RequestContext) -> Outcome {
        let context = Arc::new(request);
        debug!(
            method = %context.method,
            path = %context.path,
            request_id = %context.request_id,
            "Dispatching request"
        );

        let route = match self.routes.lookup(&context.method, &context.path) {
            Some(route) => route,
            None => {
                let error =
                    Error::NotFound(format!("{} {}", context.method, context.path));
                return self.fail(&context, error).await;
            }
        };

        // Guard chain; the first rejection aborts the request
        if let Err(error) = self.run_guards(&context, &route).await {
            return self.fail(&context, error).await;
        }

        // Pipe chain, parameter-declaration order; the first failure stops
        // everything downstream
        let args = match self.run_pipes(&context, &route).await {
            Ok(args) => args,
            Err(error) => return self.fail(&context, error).await,
        };

        // Interceptor onion around the handler
        let handler = route.handler.clone();
        let timeout = self.timeouts.for_route(&route);
        let handler_context = context.clone();
        let tail: Next = Box::pin(async move {
            let invocation = handler(handler_context, args);
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, invocation).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(format!(
                        "handler exceeded {}ms",
                        limit.as_millis()
                    ))),
                },
                None => invocation.await,
            }
        });

        let chain = self.combined_interceptors(&route);
        match chain.apply(context.clone(), tail).await {
            Ok(reply) => Outcome::from(reply),
            Err(error) => self.fail(&context, error).await,
        }
    }

    /// Route a failure through the filter chain; called at most once per
    /// dispatch.
    async fn fail(&self, context: &Arc<RequestContext>, error: Error) -> Outcome {
        let ctx = ExceptionContext::from_request(context);
        self.filters.handle(&error, &ctx).await
    }

    async fn run_guards(
        &self,
        context: &Arc<RequestContext>,
        route: &RouteDescriptor,
    ) -> Result<(), Error> {
        let guard_context =
            GuardContext::new(context.clone(), route.required_roles.clone());

        for guard in self.global_guards.iter().chain(route.guards.iter()) {
            if !guard.can_activate(&guard_context).await? {
                return Err(Error::Forbidden(format!(
                    "access denied for {} {}",
                    context.method, context.path
                )));
            }
        }
        Ok(())
    }

    async fn run_pipes(
        &self,
        context: &Arc<RequestContext>,
        route: &RouteDescriptor,
    ) -> Result<Vec<Value>, Error> {
        let mut args = Vec::with_capacity(route.params.len());
        for binding in &route.params {
            let mut value = extract_raw(context, &binding.source, &binding.meta)?;
            for pipe in &binding.pipes {
                value = pipe.transform(value, &binding.meta).await?;
            }
            args.push(value);
        }
        Ok(args)
    }

    fn combined_interceptors(&self, route: &RouteDescriptor) -> InterceptorChain {
        InterceptorChain::from_layers(
            self.global_interceptors
                .iter()
                .chain(route.interceptors.iter())
                .cloned()
                .collect(),
        )
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull a parameter's raw value out of the request context.
fn extract_raw(
    context: &RequestContext,
    source: &ParamSource,
    meta: &ParamMeta,
) -> Result<Value, Error> {
    match source {
        ParamSource::Param(name) => Ok(context
            .param(name)
            .map(|raw| Value::String(raw.clone()))
            .unwrap_or(Value::Null)),
        ParamSource::Body => {
            if context.body.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&context.body).map_err(|e| {
                Error::Validation(ValidationFailure::of(
                    FieldViolation::new(&meta.name, format!("body is not valid JSON: {e}"))
                        .with_constraint("json"),
                ))
            })
        }
    }
}
