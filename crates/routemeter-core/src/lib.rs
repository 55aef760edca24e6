//! routemeter core: metrics registry, Prometheus exposition and HTTP request
//! instrumentation.
//!
//! This crate carries no server or runtime dependency. Handlers write through
//! the [`middleware::ResponseWriter`] trait and any host (the axum server in
//! `routemeter-server`, a test, another framework) can drive them.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied outside tests. Recording
//! runs inside request handling and must never take a request down with it.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod error;
pub mod export;
pub mod middleware;
pub mod metrics;

/// Shared result type.
pub use error::{Result, RouteMeterError};
