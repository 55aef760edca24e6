//! Shared error type across routemeter crates.

use thiserror::Error;

/// Stable error codes, used in logs and asserted on by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A metric name is already taken by an incompatible descriptor.
    AlreadyRegistered,
    /// Lookup of a name that was never registered.
    UnknownMetric,
    /// Counter looked up as histogram or vice versa.
    KindMismatch,
    /// Number of label values does not match the label keys.
    LabelArity,
    /// Histogram bucket bounds are unusable.
    InvalidBuckets,
    /// Configuration rejected.
    BadConfig,
    /// I/O failure.
    Io,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AlreadyRegistered => "ALREADY_REGISTERED",
            ErrorCode::UnknownMetric => "UNKNOWN_METRIC",
            ErrorCode::KindMismatch => "KIND_MISMATCH",
            ErrorCode::LabelArity => "LABEL_ARITY",
            ErrorCode::InvalidBuckets => "INVALID_BUCKETS",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::Io => "IO",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RouteMeterError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum RouteMeterError {
    #[error("metric already registered with a different schema: {0}")]
    AlreadyRegistered(String),
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("metric {name} is a {actual}, not a {requested}")]
    KindMismatch {
        name: String,
        actual: &'static str,
        requested: &'static str,
    },
    #[error("metric {name} expects {expected} label values, got {got}")]
    LabelArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid histogram buckets: {0}")]
    InvalidBuckets(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl RouteMeterError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RouteMeterError::AlreadyRegistered(_) => ErrorCode::AlreadyRegistered,
            RouteMeterError::UnknownMetric(_) => ErrorCode::UnknownMetric,
            RouteMeterError::KindMismatch { .. } => ErrorCode::KindMismatch,
            RouteMeterError::LabelArity { .. } => ErrorCode::LabelArity,
            RouteMeterError::InvalidBuckets(_) => ErrorCode::InvalidBuckets,
            RouteMeterError::BadConfig(_) => ErrorCode::BadConfig,
            RouteMeterError::Io(_) => ErrorCode::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_its_code() {
        let cases = [
            (RouteMeterError::AlreadyRegistered("m".into()), "ALREADY_REGISTERED"),
            (RouteMeterError::UnknownMetric("m".into()), "UNKNOWN_METRIC"),
            (
                RouteMeterError::KindMismatch {
                    name: "m".into(),
                    actual: "counter",
                    requested: "histogram",
                },
                "KIND_MISMATCH",
            ),
            (
                RouteMeterError::LabelArity {
                    name: "m".into(),
                    expected: 1,
                    got: 2,
                },
                "LABEL_ARITY",
            ),
            (RouteMeterError::InvalidBuckets("empty".into()), "INVALID_BUCKETS"),
            (RouteMeterError::BadConfig("version".into()), "BAD_CONFIG"),
            (std::io::Error::new(std::io::ErrorKind::Other, "disk").into(), "IO"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code().as_str(), code, "{err}");
        }
    }
}
