//! In-process metrics registry.
//!
//! Counters and histograms with dynamic labels, stored as atomics in
//! `DashMap`s and read out through [`Registry::snapshot`].

pub mod registry;
pub mod snapshot;
pub mod vec;

pub use registry::{validate_buckets, MetricDesc, MetricKind, Registry, DEFAULT_BUCKETS};
pub use snapshot::{FamilySnapshot, HistogramSample, MetricType, Sample, SampleValue, Snapshot};
pub use vec::{Counter, Histogram};
