//! Per-request instrumentation.
//!
//! [`Instrumented`] wraps a [`Handler`]: it resolves the route label, runs the
//! handler against a [`StatusRecorder`] and records one call count, one status
//! count and one duration for the request. Recording lives in
//! [`RequestScope`]'s `Drop`, so it also runs while a handler panic unwinds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Request, StatusCode};

use crate::error::Result;
use crate::metrics::{MetricDesc, Registry, DEFAULT_BUCKETS};

use super::handler::Handler;
use super::observer::StatusRecorder;
use super::resolve::RouteResolver;
use super::writer::ResponseWriter;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const RESPONSE_STATUS: &str = "response_status";
pub const HTTP_RESPONSE_TIME_SECONDS: &str = "http_response_time_seconds";

/// Label used when the resolver finds no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

#[derive(Debug, Clone)]
pub struct HttpMetricsOptions {
    pub duration_buckets: Vec<f64>,
    pub unmatched_label: String,
}

impl Default for HttpMetricsOptions {
    fn default() -> Self {
        Self {
            duration_buckets: DEFAULT_BUCKETS.to_vec(),
            unmatched_label: UNMATCHED_ROUTE.to_string(),
        }
    }
}

/// Final state of one request, folded into the registry and then dropped.
#[derive(Debug, Clone)]
pub struct ResponseOutcome {
    pub route: String,
    pub status: StatusCode,
    pub elapsed: Duration,
}

/// The three request metrics, bound to a registry.
pub struct HttpMetrics {
    registry: Arc<Registry>,
    unmatched: String,
}

impl HttpMetrics {
    /// Register the request metrics in `registry`.
    ///
    /// A name clash with an incompatible existing family is returned as
    /// `AlreadyRegistered`; callers treat it as fatal at startup.
    pub fn install(registry: Arc<Registry>, opts: HttpMetricsOptions) -> Result<Self> {
        registry.register(MetricDesc::counter(
            HTTP_REQUESTS_TOTAL,
            "Number of HTTP requests.",
            &["path"],
        ))?;
        registry.register(MetricDesc::counter(
            RESPONSE_STATUS,
            "Status of HTTP response.",
            &["status"],
        ))?;
        registry.register(MetricDesc::histogram(
            HTTP_RESPONSE_TIME_SECONDS,
            "Duration of HTTP requests.",
            &["path"],
            &opts.duration_buckets,
        ))?;

        Ok(Self {
            registry,
            unmatched: opts.unmatched_label,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn unmatched_label(&self) -> &str {
        &self.unmatched
    }

    /// Start measuring one request. The returned scope records on drop.
    pub fn begin<W: ResponseWriter>(&self, route: String, writer: W) -> RequestScope<'_, W> {
        RequestScope {
            metrics: self,
            route,
            started: Instant::now(),
            writer: StatusRecorder::new(writer),
        }
    }

    /// Fold an outcome into the registry. Failures are logged, never returned.
    pub fn record(&self, outcome: &ResponseOutcome) {
        let route = outcome.route.as_str();

        if let Err(e) = self
            .registry
            .counter(HTTP_REQUESTS_TOTAL, &[route])
            .map(|c| c.increment())
        {
            tracing::warn!(error = %e, route, "request count not recorded");
        }
        if let Err(e) = self
            .registry
            .counter(RESPONSE_STATUS, &[outcome.status.as_str()])
            .map(|c| c.increment())
        {
            tracing::warn!(error = %e, route, "status count not recorded");
        }
        if let Err(e) = self
            .registry
            .histogram(HTTP_RESPONSE_TIME_SECONDS, &[route])
            .map(|h| h.observe(outcome.elapsed))
        {
            tracing::warn!(error = %e, route, "duration not recorded");
        }

        tracing::debug!(
            route,
            elapsed_us = u64::try_from(outcome.elapsed.as_micros()).unwrap_or(u64::MAX),
            "<-- {} {}",
            outcome.status.as_u16(),
            outcome.status.canonical_reason().unwrap_or("")
        );
    }

    /// Wrap `handler` so every request through it is measured.
    pub fn instrument<H: Handler>(
        self: &Arc<Self>,
        handler: H,
        resolver: Arc<dyn RouteResolver>,
    ) -> Instrumented<H> {
        Instrumented {
            inner: handler,
            metrics: Arc::clone(self),
            resolver,
        }
    }
}

/// One in-flight request: route label, start time and the observed writer.
pub struct RequestScope<'m, W: ResponseWriter> {
    metrics: &'m HttpMetrics,
    route: String,
    started: Instant,
    writer: StatusRecorder<W>,
}

impl<W: ResponseWriter> RequestScope<'_, W> {
    /// Writer the handler must use for this request.
    pub fn writer(&mut self) -> &mut StatusRecorder<W> {
        &mut self.writer
    }

    pub fn route(&self) -> &str {
        &self.route
    }
}

impl<W: ResponseWriter> Drop for RequestScope<'_, W> {
    fn drop(&mut self) {
        let outcome = ResponseOutcome {
            route: std::mem::take(&mut self.route),
            status: self.writer.status(),
            elapsed: self.started.elapsed(),
        };
        if std::thread::panicking() {
            tracing::error!(
                route = %outcome.route,
                status = outcome.status.as_u16(),
                "handler panicked"
            );
        }
        self.metrics.record(&outcome);
    }
}

/// A handler measured by [`HttpMetrics`].
pub struct Instrumented<H> {
    inner: H,
    metrics: Arc<HttpMetrics>,
    resolver: Arc<dyn RouteResolver>,
}

impl<H: Handler> Handler for Instrumented<H> {
    fn serve(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        let route = self
            .resolver
            .resolve(req)
            .unwrap_or_else(|| self.metrics.unmatched_label().to_string());

        let mut scope = self.metrics.begin(route, w);
        self.inner.serve(req, scope.writer());
    }
}
