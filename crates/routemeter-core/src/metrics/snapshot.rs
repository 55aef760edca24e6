//! Immutable point-in-time view of a [`Registry`](super::Registry).
//!
//! Values are read per series with relaxed loads, so a snapshot taken while
//! requests are in flight is consistent per atomic, not across metrics.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSample {
    /// `(upper bound in seconds, cumulative count)`; `+Inf` is `count`.
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    /// Sum of observations in seconds.
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Counter(u64),
    Histogram(HistogramSample),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label_values: Vec<String>,
    pub value: SampleValue,
}

#[derive(Debug, Clone)]
pub struct FamilySnapshot {
    pub name: String,
    pub help: String,
    pub kind: MetricType,
    pub label_keys: Vec<String>,
    /// Sorted by label values.
    pub samples: Vec<Sample>,
}

impl FamilySnapshot {
    fn sample(&self, labels: &[&str]) -> Option<&Sample> {
        self.samples
            .iter()
            .find(|s| s.label_values.iter().map(String::as_str).eq(labels.iter().copied()))
    }

    pub fn counter_value(&self, labels: &[&str]) -> Option<u64> {
        match self.sample(labels)?.value {
            SampleValue::Counter(v) => Some(v),
            SampleValue::Histogram(_) => None,
        }
    }

    pub fn histogram(&self, labels: &[&str]) -> Option<&HistogramSample> {
        match &self.sample(labels)?.value {
            SampleValue::Histogram(h) => Some(h),
            SampleValue::Counter(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Sorted by metric name.
    pub families: Vec<FamilySnapshot>,
}

impl Snapshot {
    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families.iter().find(|f| f.name == name)
    }

    /// Shorthand for `family(name)?.counter_value(labels)`.
    pub fn counter_value(&self, name: &str, labels: &[&str]) -> Option<u64> {
        self.family(name)?.counter_value(labels)
    }

    pub fn histogram(&self, name: &str, labels: &[&str]) -> Option<&HistogramSample> {
        self.family(name)?.histogram(labels)
    }
}
