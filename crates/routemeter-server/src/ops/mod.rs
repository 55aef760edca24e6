//! Operational HTTP endpoints.
//!
//! - `/healthz`       : liveness
//! - `metrics_path`   : Prometheus text format (instrumented like any route)
//! - fallback         : 404 for unrouted requests

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::IntoResponse;
use bytes::Bytes;
use routemeter_core::export;
use routemeter_core::metrics::Registry;
use routemeter_core::middleware::{Handler, ResponseWriter};

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Scrape endpoint: renders a registry snapshot.
pub struct MetricsEndpoint {
    registry: Arc<Registry>,
}

impl MetricsEndpoint {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl Handler for MetricsEndpoint {
    fn serve(&self, _req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        let body = export::render(&self.registry.snapshot());

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(export::CONTENT_TYPE));
        w.write_headers(&headers);
        w.write_status(StatusCode::OK);
        if let Err(e) = w.write_body(body.as_bytes()) {
            tracing::warn!(error = %e, "metrics body write failed");
        }
    }
}

pub struct NotFound;

impl Handler for NotFound {
    fn serve(&self, _req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        w.write_status(StatusCode::NOT_FOUND);
        let _ = w.write_body(b"404 page not found\n");
    }
}
