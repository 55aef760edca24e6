use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{Result, RouteMeterError};

use super::snapshot::{FamilySnapshot, MetricType, Snapshot};
use super::vec::{Counter, CounterVec, Histogram, HistogramVec};

/// Prometheus client default buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    Counter,
    Histogram { buckets: Vec<f64> },
}

impl MetricKind {
    fn metric_type(&self) -> MetricType {
        match self {
            MetricKind::Counter => MetricType::Counter,
            MetricKind::Histogram { .. } => MetricType::Histogram,
        }
    }
}

/// Schema of one metric family. Two descriptors are compatible only if every
/// field matches.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDesc {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_keys: Vec<String>,
}

impl MetricDesc {
    pub fn counter(name: &str, help: &str, label_keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind: MetricKind::Counter,
            label_keys: label_keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn histogram(name: &str, help: &str, label_keys: &[&str], buckets: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind: MetricKind::Histogram {
                buckets: buckets.to_vec(),
            },
            label_keys: label_keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Bucket bounds must be non-empty, finite, positive and strictly increasing.
pub fn validate_buckets(buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(RouteMeterError::InvalidBuckets("no buckets".into()));
    }
    if let Some(b) = buckets.iter().find(|b| !b.is_finite() || **b <= 0.0) {
        return Err(RouteMeterError::InvalidBuckets(format!(
            "bound {b} is not a positive finite number"
        )));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(RouteMeterError::InvalidBuckets(
            "bounds must be strictly increasing".into(),
        ));
    }
    Ok(())
}

enum Series {
    Counter(Arc<CounterVec>),
    Histogram(Arc<HistogramVec>),
}

struct Family {
    desc: MetricDesc,
    series: Series,
}

impl Family {
    fn new(desc: MetricDesc) -> Self {
        let series = match &desc.kind {
            MetricKind::Counter => Series::Counter(Arc::new(CounterVec::default())),
            MetricKind::Histogram { buckets } => {
                Series::Histogram(Arc::new(HistogramVec::new(buckets)))
            }
        };
        Self { desc, series }
    }

    fn check_arity(&self, labels: &[&str]) -> Result<()> {
        if labels.len() != self.desc.label_keys.len() {
            return Err(RouteMeterError::LabelArity {
                name: self.desc.name.clone(),
                expected: self.desc.label_keys.len(),
                got: labels.len(),
            });
        }
        Ok(())
    }
}

/// Named, labeled counters and histograms.
///
/// A registry is an ordinary value: build one at startup, wrap it in an `Arc`
/// and hand it to whatever records or exports. Families are never removed.
#[derive(Default)]
pub struct Registry {
    families: DashMap<String, Family>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family. Re-registering an identical descriptor is a no-op;
    /// any other descriptor under a taken name fails.
    pub fn register(&self, desc: MetricDesc) -> Result<()> {
        if let MetricKind::Histogram { buckets } = &desc.kind {
            validate_buckets(buckets)?;
        }

        match self.families.entry(desc.name.clone()) {
            Entry::Occupied(e) => {
                if e.get().desc == desc {
                    Ok(())
                } else {
                    Err(RouteMeterError::AlreadyRegistered(desc.name))
                }
            }
            Entry::Vacant(e) => {
                tracing::debug!(metric = %desc.name, kind = desc.kind.metric_type().as_str(), "metric registered");
                e.insert(Family::new(desc));
                Ok(())
            }
        }
    }

    /// Counter series for `(name, labels)`, created on first use.
    pub fn counter(&self, name: &str, labels: &[&str]) -> Result<Counter> {
        let fam = self
            .families
            .get(name)
            .ok_or_else(|| RouteMeterError::UnknownMetric(name.to_string()))?;
        fam.check_arity(labels)?;
        match &fam.series {
            Series::Counter(vec) => Ok(vec.with_label_values(labels)),
            Series::Histogram(_) => Err(RouteMeterError::KindMismatch {
                name: name.to_string(),
                actual: MetricType::Histogram.as_str(),
                requested: MetricType::Counter.as_str(),
            }),
        }
    }

    /// Histogram series for `(name, labels)`, created on first use.
    pub fn histogram(&self, name: &str, labels: &[&str]) -> Result<Histogram> {
        let fam = self
            .families
            .get(name)
            .ok_or_else(|| RouteMeterError::UnknownMetric(name.to_string()))?;
        fam.check_arity(labels)?;
        match &fam.series {
            Series::Histogram(vec) => Ok(vec.with_label_values(labels)),
            Series::Counter(_) => Err(RouteMeterError::KindMismatch {
                name: name.to_string(),
                actual: MetricType::Counter.as_str(),
                requested: MetricType::Histogram.as_str(),
            }),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut families: Vec<FamilySnapshot> = self
            .families
            .iter()
            .map(|r| {
                let fam = r.value();
                let mut samples = match &fam.series {
                    Series::Counter(vec) => vec.samples(),
                    Series::Histogram(vec) => vec.samples(),
                };
                samples.sort_by(|a, b| a.label_values.cmp(&b.label_values));
                FamilySnapshot {
                    name: fam.desc.name.clone(),
                    help: fam.desc.help.clone(),
                    kind: fam.desc.kind.metric_type(),
                    label_keys: fam.desc.label_keys.clone(),
                    samples,
                }
            })
            .collect();
        families.sort_by(|a, b| a.name.cmp(&b.name));
        Snapshot { families }
    }
}
