//! Shared application state for the routemeter server.
//!
//! Owns the metric registry and the request instrumentation built on it.
//! Startup errors (metric registration conflicts) are returned, not panicked.

use std::sync::Arc;

use axum::http::StatusCode;
use routemeter_core::error::Result;
use routemeter_core::metrics::Registry;
use routemeter_core::middleware::{
    handler_fn, Handler, HttpMetrics, HttpMetricsOptions, ResponseWriter, RouteResolver,
};

use crate::config::AppConfig;
use crate::resolve::MatchedPathResolver;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AppConfig,
    metrics: Arc<HttpMetrics>,
    resolver: Arc<dyn RouteResolver>,
    body_rejected: Arc<dyn Handler>,
}

impl AppState {
    /// Build application state around a fresh registry.
    pub fn new(cfg: AppConfig) -> Result<Self> {
        Self::with_registry(cfg, Arc::new(Registry::new()))
    }

    /// Build application state recording into `registry`, which may already
    /// hold other families.
    pub fn with_registry(cfg: AppConfig, registry: Arc<Registry>) -> Result<Self> {
        let opts = HttpMetricsOptions {
            duration_buckets: cfg.metrics.duration_buckets.clone(),
            unmatched_label: cfg.metrics.unmatched_label.clone(),
        };
        let metrics = Arc::new(HttpMetrics::install(registry, opts)?);
        let resolver: Arc<dyn RouteResolver> = Arc::new(MatchedPathResolver);

        let body_rejected: Arc<dyn Handler> = Arc::new(metrics.instrument(
            handler_fn(|_req, w: &mut dyn ResponseWriter| {
                w.write_status(StatusCode::PAYLOAD_TOO_LARGE);
                let _ = w.write_body(b"request body too large\n");
            }),
            Arc::clone(&resolver),
        ));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics,
                resolver,
                body_rejected,
            }),
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(self.inner.metrics.registry())
    }

    /// Wrap `handler` with request instrumentation labeled by matched route.
    pub fn instrument<H: Handler + 'static>(&self, handler: H) -> Arc<dyn Handler> {
        Arc::new(
            self.inner
                .metrics
                .instrument(handler, Arc::clone(&self.inner.resolver)),
        )
    }

    /// Instrumented handler answering requests whose body could not be read.
    pub fn body_rejected(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.inner.body_rejected)
    }
}
