//! Synchronous handler model plus the instrumentation that wraps it.

pub mod handler;
pub mod instrument;
pub mod observer;
pub mod resolve;
pub mod writer;

pub use handler::{handler_fn, Handler, HandlerFn};
pub use instrument::{
    HttpMetrics, HttpMetricsOptions, Instrumented, RequestScope, ResponseOutcome,
    HTTP_REQUESTS_TOTAL, HTTP_RESPONSE_TIME_SECONDS, RESPONSE_STATUS, UNMATCHED_ROUTE,
};
pub use observer::StatusRecorder;
pub use resolve::{RouteResolver, TemplateResolver};
pub use writer::{ResponseBuffer, ResponseWriter};
