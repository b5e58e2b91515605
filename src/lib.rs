// Gantry - a composable request-processing pipeline for Rust
//
// This library wraps opaque async handlers in an ordered chain of
// cross-cutting stages: authorization guards, per-parameter pipes,
// around-handler interceptors, and exception filters.

// Re-export core functionality
pub use gantry_core::*;

// Re-export optional crates
#[cfg(feature = "validation")]
pub use gantry_validation;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AccessExceptionFilter,
        AllExceptionsFilter,
        AuthenticationGuard,
        CacheInterceptor,
        Dispatcher,
        Error,
        ErrorKind,
        ErrorsInterceptor,
        ExceptionContext,
        ExceptionFilter,
        ExceptionFilterChain,
        Expects,
        FieldViolation,
        FnExceptionFilter,
        FnGuard,
        Guard,
        GuardContext,
        Interceptor,
        InterceptorChain,
        LoggingInterceptor,
        Metadata,
        Next,
        Outcome,
        ParamBinding,
        ParamMeta,
        ParamSource,
        ParseIntPipe,
        Pipe,
        Principal,
        Reply,
        RequestContext,
        ResponseMeta,
        RolesGuard,
        RouteDescriptor,
        RouteTable,
        TimeoutConfig,
        TransformInterceptor,
        ValidationExceptionFilter,
        ValidationFailure,
        handler_fn,
    };
}
