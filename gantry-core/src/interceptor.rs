// Interceptors for wrapping handler execution

use crate::context::RequestContext;
use crate::error::{Error, ErrorKind};
use crate::logging::{debug, info, trace};
use crate::outcome::Reply;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The continuation handed to an interceptor: the remaining interceptors
/// and, innermost, the handler itself. Awaiting it runs the rest of the
/// pipeline; an interceptor may also drop it to short-circuit.
pub type Next = Pin<Box<dyn Future<Output = Result<Reply, Error>> + Send>>;

/// Interceptor trait for around-handler logic.
///
/// Interceptors nest like a call stack: the first registered runs its
/// before-logic first and sees the result last.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, context: Arc<RequestContext>, next: Next) -> Result<Reply, Error>;
}

/// Onion executor over an ordered interceptor list.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Arc<Vec<Arc<dyn Interceptor>>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self {
            interceptors: Arc::new(Vec::new()),
        }
    }

    pub fn from_layers(layers: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            interceptors: Arc::new(layers),
        }
    }

    /// Add an interceptor to the chain
    pub fn use_interceptor<I: Interceptor + 'static>(&mut self, interceptor: I) {
        let mut layers = (*self.interceptors).clone();
        layers.push(Arc::new(interceptor));
        self.interceptors = Arc::new(layers);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wrap the tail future in every registered layer and return the
    /// composed future.
    pub fn apply(&self, context: Arc<RequestContext>, tail: Next) -> Next {
        debug!(
            interceptor_count = self.interceptors.len(),
            path = %context.path,
            method = %context.method,
            "Executing interceptor chain"
        );
        self.execute_from(0, context, tail)
    }

    fn execute_from(&self, index: usize, context: Arc<RequestContext>, tail: Next) -> Next {
        if index >= self.interceptors.len() {
            trace!("Interceptor chain complete, entering handler");
            tail
        } else {
            let interceptor = self.interceptors[index].clone();
            let chain = self.clone();

            trace!(interceptor_index = index, "Entering interceptor");
            Box::pin(async move {
                let next = chain.execute_from(index + 1, context.clone(), tail);
                interceptor.intercept(context, next).await
            })
        }
    }
}

/// Wraps the inner result into a standard `{ "data": ... }` envelope.
pub struct TransformInterceptor;

#[async_trait]
impl Interceptor for TransformInterceptor {
    async fn intercept(&self, _context: Arc<RequestContext>, next: Next) -> Result<Reply, Error> {
        let reply = next.await?;
        Ok(reply.map_payload(|payload| json!({ "data": payload })))
    }
}

/// Logs method, path, and elapsed time around the continuation without
/// altering the payload.
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(&self, context: Arc<RequestContext>, next: Next) -> Result<Reply, Error> {
        let start = Instant::now();
        let method = context.method.clone();
        let path = context.path.clone();

        info!(method = %method, path = %path, "Request entering handler chain");

        let result = next.await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                info!(
                    method = %method,
                    path = %path,
                    duration_ms = duration.as_millis() as u64,
                    "Request completed"
                );
            }
            Err(e) => {
                info!(
                    method = %method,
                    path = %path,
                    duration_ms = duration.as_millis() as u64,
                    error = %e,
                    "Request failed"
                );
            }
        }

        result
    }
}

/// Rewrites failures propagating up from the continuation into a generic
/// upstream failure, discarding the original detail.
///
/// Kinds listed in `retain` pass through untranslated; by default every
/// failure is narrowed.
pub struct ErrorsInterceptor {
    retain: Vec<ErrorKind>,
}

impl ErrorsInterceptor {
    pub fn new() -> Self {
        Self { retain: Vec::new() }
    }

    /// Let a failure kind pass through untranslated.
    pub fn retain_kind(mut self, kind: ErrorKind) -> Self {
        self.retain.push(kind);
        self
    }
}

impl Default for ErrorsInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for ErrorsInterceptor {
    async fn intercept(&self, _context: Arc<RequestContext>, next: Next) -> Result<Reply, Error> {
        match next.await {
            Ok(reply) => Ok(reply),
            Err(e) if self.retain.contains(&e.kind()) => Err(e),
            Err(e) => {
                debug!(original = %e, "Translating handler failure to upstream failure");
                Err(Error::Upstream("upstream handler failed".to_string()))
            }
        }
    }
}

/// In-memory reply cache keyed by method and path.
///
/// On a fresh hit the continuation is never invoked; the cached reply is
/// returned directly and outer interceptors still shape it as usual.
pub struct CacheInterceptor {
    ttl: Duration,
    store: RwLock<HashMap<String, (Instant, Reply)>>,
}

impl CacheInterceptor {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Interceptor for CacheInterceptor {
    async fn intercept(&self, context: Arc<RequestContext>, next: Next) -> Result<Reply, Error> {
        let key = format!("{} {}", context.method, context.path);

        if let Some((stored_at, reply)) = self.store.read().get(&key)
            && stored_at.elapsed() < self.ttl
        {
            trace!(key = %key, "Reply cache hit");
            return Ok(reply.clone());
        }

        let reply = next.await?;
        self.store
            .write()
            .insert(key, (Instant::now(), reply.clone()));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tail_returning(payload: Value) -> Next {
        Box::pin(async move { Ok(Reply::new(payload)) })
    }

    #[tokio::test]
    async fn test_transform_interceptor_envelopes_payload() {
        let context = Arc::new(RequestContext::new("GET", "/cats"));
        let reply = TransformInterceptor
            .intercept(context, tail_returning(json!({"message": "Hello"})))
            .await
            .unwrap();

        assert_eq!(reply.payload, json!({"data": {"message": "Hello"}}));
    }

    #[tokio::test]
    async fn test_logging_interceptor_passes_payload_through() {
        let context = Arc::new(RequestContext::new("GET", "/cats"));
        let reply = LoggingInterceptor
            .intercept(context, tail_returning(json!([1, 2, 3])))
            .await
            .unwrap();

        assert_eq!(reply.payload, json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_errors_interceptor_narrows_failures() {
        let context = Arc::new(RequestContext::new("GET", "/cats"));
        let tail: Next =
            Box::pin(async { Err(Error::Internal("database exploded".to_string())) });

        let err = ErrorsInterceptor::new()
            .intercept(context, tail)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        // The original detail is gone
        assert!(!err.to_string().contains("database"));
    }

    #[tokio::test]
    async fn test_errors_interceptor_retains_configured_kinds() {
        let context = Arc::new(RequestContext::new("GET", "/cats"));
        let tail: Next = Box::pin(async { Err(Error::validation("id", "bad")) });

        let err = ErrorsInterceptor::new()
            .retain_kind(ErrorKind::Validation)
            .intercept(context, tail)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_cache_interceptor_short_circuits() {
        let interceptor = CacheInterceptor::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let context = Arc::new(RequestContext::new("GET", "/cats"));
            let calls = calls.clone();
            let tail: Next = Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Reply::new(json!({"cached": true})))
            });

            let reply = interceptor.intercept(context, tail).await.unwrap();
            assert_eq!(reply.payload, json!({"cached": true}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chain_onion_ordering() {
        struct Recorder {
            name: &'static str,
            log: Arc<parking_lot::Mutex<Vec<String>>>,
        }

        #[async_trait]
        impl Interceptor for Recorder {
            async fn intercept(
                &self,
                _context: Arc<RequestContext>,
                next: Next,
            ) -> Result<Reply, Error> {
                self.log.lock().push(format!("{}:before", self.name));
                let result = next.await;
                self.log.lock().push(format!("{}:after", self.name));
                result
            }
        }

        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut chain = InterceptorChain::new();
        chain.use_interceptor(Recorder {
            name: "A",
            log: log.clone(),
        });
        chain.use_interceptor(Recorder {
            name: "B",
            log: log.clone(),
        });

        let handler_log = log.clone();
        let tail: Next = Box::pin(async move {
            handler_log.lock().push("handler".to_string());
            Ok(Reply::empty())
        });

        let context = Arc::new(RequestContext::new("GET", "/cats"));
        chain.apply(context, tail).await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["A:before", "B:before", "handler", "B:after", "A:after"]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_runs_tail() {
        let chain = InterceptorChain::new();
        let context = Arc::new(RequestContext::new("GET", "/cats"));
        let reply = chain
            .apply(context, tail_returning(json!(1)))
            .await
            .unwrap();
        assert_eq!(reply.payload, json!(1));
    }
}
