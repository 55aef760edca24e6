//! Labeled metric families backed by `DashMap`.
//!
//! Each family maps a label-value tuple to a shared atomic aggregate. New
//! label sets are created through `DashMap::entry`, which holds the shard
//! lock across the check-and-insert: concurrent first use creates exactly one
//! entry and every racer gets a handle to it.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::snapshot::{HistogramSample, Sample, SampleValue};

fn key_of(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|v| v.to_string()).collect()
}

/// Handle to a single counter series.
#[derive(Clone, Debug)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// Increment by 1.
    pub fn increment(&self) {
        self.add(1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, v: u64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<String>, Arc<AtomicU64>>,
}

impl CounterVec {
    pub fn with_label_values(&self, labels: &[&str]) -> Counter {
        let value = self
            .map
            .entry(key_of(labels))
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        Counter { value }
    }

    pub(crate) fn samples(&self) -> Vec<Sample> {
        self.map
            .iter()
            .map(|r| Sample {
                label_values: r.key().clone(),
                value: SampleValue::Counter(r.value().load(Ordering::Relaxed)),
            })
            .collect()
    }
}

struct HistogramCore {
    /// Cumulative: slot `i` counts every observation `<= bounds[i]`.
    buckets: Box<[AtomicU64]>,
    count: AtomicU64,
    sum_nanos: AtomicU64,
}

impl HistogramCore {
    fn new(len: usize) -> Self {
        Self {
            buckets: (0..len).map(|_| AtomicU64::new(0)).collect(),
            count: AtomicU64::new(0),
            sum_nanos: AtomicU64::new(0),
        }
    }
}

/// Handle to a single histogram series.
#[derive(Clone)]
pub struct Histogram {
    bounds: Arc<[f64]>,
    core: Arc<HistogramCore>,
}

impl Histogram {
    /// Fold one duration into the distribution.
    pub fn observe(&self, value: Duration) {
        let secs = value.as_secs_f64();
        let nanos = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);

        self.core.count.fetch_add(1, Ordering::Relaxed);
        self.core.sum_nanos.fetch_add(nanos, Ordering::Relaxed);

        for (slot, &le) in self.core.buckets.iter().zip(self.bounds.iter()) {
            if secs <= le {
                slot.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.core.count.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Histogram")
            .field("bounds", &self.bounds)
            .field("count", &self.count())
            .finish()
    }
}

pub struct HistogramVec {
    bounds: Arc<[f64]>,
    map: DashMap<Vec<String>, Arc<HistogramCore>>,
}

impl HistogramVec {
    /// `bounds` must already be validated (finite, positive, strictly increasing).
    pub(crate) fn new(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.into(),
            map: DashMap::new(),
        }
    }

    pub fn with_label_values(&self, labels: &[&str]) -> Histogram {
        let len = self.bounds.len();
        let core = self
            .map
            .entry(key_of(labels))
            .or_insert_with(|| Arc::new(HistogramCore::new(len)))
            .clone();
        Histogram {
            bounds: Arc::clone(&self.bounds),
            core,
        }
    }

    pub(crate) fn samples(&self) -> Vec<Sample> {
        self.map
            .iter()
            .map(|r| {
                let core = r.value();
                let buckets = self
                    .bounds
                    .iter()
                    .zip(core.buckets.iter())
                    .map(|(&le, n)| (le, n.load(Ordering::Relaxed)))
                    .collect();
                let sum_nanos = core.sum_nanos.load(Ordering::Relaxed);
                Sample {
                    label_values: r.key().clone(),
                    value: SampleValue::Histogram(HistogramSample {
                        buckets,
                        count: core.count.load(Ordering::Relaxed),
                        sum: Duration::from_nanos(sum_nanos).as_secs_f64(),
                    }),
                }
            })
            .collect()
    }
}
