// Handler timeout configuration

use crate::route::RouteDescriptor;
use std::time::Duration;

/// Timeout policy for handler invocation.
///
/// A route-level override on the descriptor wins over the configured
/// default; with neither set, handlers run unbounded. Expiry is injected
/// into the pipeline as a timeout failure at the point the handler would
/// have returned, so the interceptor chain observes it exactly like a
/// thrown error.
#[derive(Debug, Clone, Default)]
pub struct TimeoutConfig {
    default: Option<Duration>,
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default timeout in seconds.
    pub fn default_timeout(mut self, seconds: u64) -> Self {
        self.default = Some(Duration::from_secs(seconds));
        self
    }

    /// Sets the default timeout in milliseconds.
    pub fn default_timeout_ms(mut self, ms: u64) -> Self {
        self.default = Some(Duration::from_millis(ms));
        self
    }

    /// Effective timeout for a route.
    pub fn for_route(&self, route: &RouteDescriptor) -> Option<Duration> {
        route.timeout.or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Reply;
    use crate::route::handler_fn;

    fn route() -> RouteDescriptor {
        RouteDescriptor::new(
            "GET",
            "/cats",
            handler_fn(|_context, _args| async { Ok(Reply::empty()) }),
        )
    }

    #[test]
    fn test_no_timeout_by_default() {
        let config = TimeoutConfig::new();
        assert_eq!(config.for_route(&route()), None);
    }

    #[test]
    fn test_default_applies() {
        let config = TimeoutConfig::new().default_timeout(30);
        assert_eq!(config.for_route(&route()), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_route_override_wins() {
        let config = TimeoutConfig::new().default_timeout(30);
        let route = route().with_timeout(Duration::from_millis(250));
        assert_eq!(config.for_route(&route), Some(Duration::from_millis(250)));
    }
}
