//! Top-level facade crate for routemeter.
//!
//! Re-exports the instrumentation core and the HTTP server library so users can depend on a single crate.

pub mod core {
    pub use routemeter_core::*;
}

pub mod server {
    pub use routemeter_server::*;
}
