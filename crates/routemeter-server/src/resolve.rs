//! Route labels from axum's router.

use axum::extract::MatchedPath;
use bytes::Bytes;
use axum::http::Request;
use routemeter_core::middleware::RouteResolver;

/// Reads the route template axum matched (e.g. `/users/:id`).
///
/// axum inserts [`MatchedPath`] into the request extensions for every routed
/// request; fallback requests carry none and resolve to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchedPathResolver;

impl RouteResolver for MatchedPathResolver {
    fn resolve(&self, req: &Request<Bytes>) -> Option<String> {
        req.extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
    }
}
