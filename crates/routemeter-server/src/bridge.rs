//! axum <-> synchronous handler bridge.
//!
//! The request body is collected up to `server.max_body_bytes`, then the
//! (already instrumented) handler runs on the blocking pool against a
//! [`ResponseBuffer`]. A handler panic reaches us as a `JoinError` after the
//! instrumentation has recorded it, and is answered with a 500.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
};
use bytes::Bytes;
use routemeter_core::middleware::{Handler, ResponseBuffer};

use crate::app_state::AppState;

pub async fn dispatch(state: AppState, handler: Arc<dyn Handler>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let limit = state.cfg().server.max_body_bytes;

    let (body, handler) = match axum::body::to_bytes(body, limit).await {
        Ok(b) => (b, handler),
        Err(e) => {
            tracing::debug!(error = %e, limit, "request body rejected");
            (Bytes::new(), state.body_rejected())
        }
    };
    let req = axum::http::Request::from_parts(parts, body);

    let joined = tokio::task::spawn_blocking(move || {
        let mut buf = ResponseBuffer::new();
        handler.serve(&req, &mut buf);
        buf.into_response()
    })
    .await;

    match joined {
        Ok(resp) => resp.map(Body::from),
        Err(e) if e.is_panic() => {
            tracing::error!(error = %e, "handler panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error\n").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "handler task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error\n").into_response()
        }
    }
}

/// Route every method of a path to `handler`, instrumented.
pub fn mount<H: Handler + 'static>(state: &AppState, handler: H) -> MethodRouter<AppState> {
    let handler = state.instrument(handler);
    any(move |State(state): State<AppState>, req: Request| {
        dispatch(state, Arc::clone(&handler), req)
    })
}
