//! Axum router wiring.
//!
//! Every route except `/healthz` goes through request instrumentation: the
//! scrape endpoint, the static file tree (`/` and `/*path`) and the fallback,
//! which is labeled with the unmatched sentinel.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    routing::get,
    Router,
};

use crate::{
    app_state::AppState,
    bridge::{dispatch, mount},
    ops,
    static_files::StaticFiles,
};

pub fn build_router(state: AppState) -> Router {
    let server = &state.cfg().server;

    let mut router = Router::new()
        .route("/healthz", get(ops::healthz))
        .route(
            &server.metrics_path,
            mount(&state, ops::MetricsEndpoint::new(state.registry())),
        );

    if let Some(dir) = &server.static_dir {
        let files = Arc::new(StaticFiles::new(dir));
        router = router
            .route("/", mount(&state, Arc::clone(&files)))
            .route("/*path", mount(&state, files));
    }

    let not_found = state.instrument(ops::NotFound);
    router
        .fallback(move |State(state): State<AppState>, req: Request| {
            dispatch(state, Arc::clone(&not_found), req)
        })
        .with_state(state)
}
