// Route descriptors and the registration-time route table

use crate::context::RequestContext;
use crate::guard::Guard;
use crate::interceptor::Interceptor;
use crate::outcome::Reply;
use crate::pipe::{Expects, ParamMeta, Pipe};
use crate::Error;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Type alias for async route handler functions.
///
/// Handlers receive the request context plus the validated positional
/// arguments produced by the pipe chain, in parameter-declaration order.
pub type HandlerFn = Arc<
    dyn Fn(
            Arc<RequestContext>,
            Vec<Value>,
        ) -> Pin<Box<dyn Future<Output = Result<Reply, Error>> + Send>>
        + Send
        + Sync,
>;

/// Adapt an async closure into a `HandlerFn`.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Arc<RequestContext>, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, Error>> + Send + 'static,
{
    Arc::new(move |context, args| Box::pin(f(context, args)))
}

/// Where a handler parameter's raw value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    /// A named entry in the raw parameter map
    Param(String),
    /// The raw request body, parsed as JSON
    Body,
}

/// One declared handler parameter: its raw source, its expected shape, and
/// the pipes bound to it in registration order.
pub struct ParamBinding {
    pub source: ParamSource,
    pub meta: ParamMeta,
    pub pipes: Vec<Arc<dyn Pipe>>,
}

impl ParamBinding {
    /// Bind a parameter to a named raw value.
    pub fn param(name: impl Into<String>, expects: Expects) -> Self {
        let name = name.into();
        Self {
            source: ParamSource::Param(name.clone()),
            meta: ParamMeta::new(name, expects),
            pipes: Vec::new(),
        }
    }

    /// Bind a parameter to the request body.
    pub fn body(expects: Expects) -> Self {
        Self {
            source: ParamSource::Body,
            meta: ParamMeta::new("body", expects),
            pipes: Vec::new(),
        }
    }

    /// Bind a pipe; pipes run in the order they were bound.
    pub fn pipe<P: Pipe + 'static>(mut self, pipe: P) -> Self {
        self.pipes.push(Arc::new(pipe));
        self
    }

    /// Bind an already-shared pipe.
    pub fn pipe_arc(mut self, pipe: Arc<dyn Pipe>) -> Self {
        self.pipes.push(pipe);
        self
    }
}

/// Everything the dispatcher needs to know about one registered route.
///
/// Populated at registration time; the dispatcher only reads it.
pub struct RouteDescriptor {
    pub method: String,
    pub path: String,
    pub required_roles: Vec<String>,
    pub guards: Vec<Arc<dyn Guard>>,
    pub interceptors: Vec<Arc<dyn Interceptor>>,
    pub params: Vec<ParamBinding>,
    pub handler: HandlerFn,
    pub timeout: Option<Duration>,
}

impl RouteDescriptor {
    pub fn new(method: impl Into<String>, path: impl Into<String>, handler: HandlerFn) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            required_roles: Vec::new(),
            guards: Vec::new(),
            interceptors: Vec::new(),
            params: Vec::new(),
            handler,
            timeout: None,
        }
    }

    /// Declare a role requirement read by role-based guards.
    pub fn require_role(mut self, role: impl Into<String>) -> Self {
        self.required_roles.push(role.into());
        self
    }

    /// Add a route-local guard.
    pub fn guard<G: Guard + 'static>(mut self, guard: G) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Add a route-local interceptor.
    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Declare a handler parameter; parameters run in declaration order.
    pub fn param(mut self, binding: ParamBinding) -> Self {
        self.params.push(binding);
        self
    }

    /// Override the handler timeout for this route.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Registration-time table of route descriptors keyed by method and path.
///
/// Pattern matching is owned by the external router; lookups here are
/// exact.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, Arc<RouteDescriptor>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register a descriptor, replacing any previous one for the same
    /// method and path.
    pub fn register(&mut self, descriptor: RouteDescriptor) {
        let key = Self::key(&descriptor.method, &descriptor.path);
        self.routes.insert(key, Arc::new(descriptor));
    }

    /// Look up the descriptor for a method and path.
    pub fn lookup(&self, method: &str, path: &str) -> Option<Arc<RouteDescriptor>> {
        self.routes.get(&Self::key(method, path)).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn key(method: &str, path: &str) -> String {
        format!("{method} {path}")
    }
}
