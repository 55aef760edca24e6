//! routemeter server library entry.
//!
//! This crate wires the instrumentation core into an axum server: config,
//! shared state, the axum bridge for synchronous handlers, the static file
//! handler and the scrape endpoint. It is consumed by the binary (`main.rs`)
//! and by integration tests.

pub mod app_state;
pub mod bridge;
pub mod config;
pub mod ops;
pub mod resolve;
pub mod router;
pub mod static_files;
