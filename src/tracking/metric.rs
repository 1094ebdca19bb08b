//! Metric point - one (step, value) sample logged against a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single metric data point, ordered by step within a run and key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    step: u64,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl MetricPoint {
    /// Create a metric point stamped with the current time.
    #[must_use]
    pub fn new(step: u64, value: f64) -> Self {
        Self {
            step,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Get the step index.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the recorded value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the wall-clock timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_point_fields() {
        let point = MetricPoint::new(9, -13.5);
        assert_eq!(point.step(), 9);
        assert!((point.value() - -13.5).abs() < f64::EPSILON);
        assert!(point.timestamp().timestamp() > 0);
    }
}
