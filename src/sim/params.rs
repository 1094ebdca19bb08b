//! Simulation parameters and their flattened query form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::process::ProcessParams;
use crate::{Error, Result};

/// Parameters of one simulation run.
///
/// Owned by the orchestrator for the lifetime of a run; value identity
/// (via [`flatten`](Self::flatten)) is the memoization key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    total_step: u64,
    record_per: u64,
    save_full_trajectory: bool,
    process: ProcessParams,
}

impl SimulationParams {
    /// Create validated simulation parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `total_step` or `record_per`
    /// is zero.
    pub fn new(
        total_step: u64,
        record_per: u64,
        save_full_trajectory: bool,
        process: ProcessParams,
    ) -> Result<Self> {
        if total_step == 0 {
            return Err(Error::InvalidParameter("total_step must be positive".into()));
        }
        if record_per == 0 {
            return Err(Error::InvalidParameter("record_per must be positive".into()));
        }
        Ok(Self {
            total_step,
            record_per,
            save_full_trajectory,
            process,
        })
    }

    /// Create a builder with the conventional defaults
    /// (`total_step = 1000`, `record_per = 10`, full trajectory on).
    #[must_use]
    pub const fn builder(process: ProcessParams) -> SimulationParamsBuilder {
        SimulationParamsBuilder::new(process)
    }

    /// Get the total number of steps.
    #[must_use]
    pub const fn total_step(&self) -> u64 {
        self.total_step
    }

    /// Get the metric sampling cadence.
    #[must_use]
    pub const fn record_per(&self) -> u64 {
        self.record_per
    }

    /// Whether the full trajectory is captured and persisted.
    #[must_use]
    pub const fn save_full_trajectory(&self) -> bool {
        self.save_full_trajectory
    }

    /// Get the process parameters.
    #[must_use]
    pub const fn process(&self) -> ProcessParams {
        self.process
    }

    /// Flatten to an order-stable mapping of dotted keys to `Display`-formatted
    /// values, the exact form logged as run params and used as the
    /// memoization query.
    ///
    /// Values are compared by the store as strings, so two parameter sets
    /// that are numerically equal but format differently (`1` vs `1.0`) do
    /// not match. That fragility is part of the contract, not normalized
    /// away here.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("total_step".to_string(), self.total_step.to_string()),
            ("record_per".to_string(), self.record_per.to_string()),
            (
                "save_full_trajectory".to_string(),
                self.save_full_trajectory.to_string(),
            ),
            ("process.seed".to_string(), self.process.seed().to_string()),
            (
                "process.initial_state".to_string(),
                self.process.initial_state().to_string(),
            ),
            ("process.sigma".to_string(), self.process.sigma().to_string()),
        ])
    }
}

/// Builder for [`SimulationParams`].
#[derive(Debug)]
pub struct SimulationParamsBuilder {
    total_step: u64,
    record_per: u64,
    save_full_trajectory: bool,
    process: ProcessParams,
}

impl SimulationParamsBuilder {
    /// Create a builder with default stepping configuration.
    #[must_use]
    pub const fn new(process: ProcessParams) -> Self {
        Self {
            total_step: 1000,
            record_per: 10,
            save_full_trajectory: true,
            process,
        }
    }

    /// Set the total number of steps.
    #[must_use]
    pub const fn total_step(mut self, total_step: u64) -> Self {
        self.total_step = total_step;
        self
    }

    /// Set the metric sampling cadence.
    #[must_use]
    pub const fn record_per(mut self, record_per: u64) -> Self {
        self.record_per = record_per;
        self
    }

    /// Enable or disable full-trajectory capture.
    #[must_use]
    pub const fn save_full_trajectory(mut self, save: bool) -> Self {
        self.save_full_trajectory = save;
        self
    }

    /// Build validated [`SimulationParams`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] on zero `total_step` or
    /// `record_per`.
    pub fn build(self) -> Result<SimulationParams> {
        SimulationParams::new(
            self.total_step,
            self.record_per,
            self.save_full_trajectory,
            self.process,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process() -> ProcessParams {
        ProcessParams::new(123, 0.0, 10.0).unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let params = SimulationParams::builder(process()).build().unwrap();
        assert_eq!(params.total_step(), 1000);
        assert_eq!(params.record_per(), 10);
        assert!(params.save_full_trajectory());
    }

    #[test]
    fn test_zero_bounds_rejected() {
        assert!(SimulationParams::new(0, 10, false, process()).is_err());
        assert!(SimulationParams::new(100, 0, false, process()).is_err());
    }

    #[test]
    fn test_flatten_keys_and_values() {
        let params = SimulationParams::builder(process())
            .total_step(100)
            .record_per(5)
            .save_full_trajectory(false)
            .build()
            .unwrap();
        let flat = params.flatten();
        assert_eq!(flat.get("total_step"), Some(&"100".to_string()));
        assert_eq!(flat.get("record_per"), Some(&"5".to_string()));
        assert_eq!(flat.get("save_full_trajectory"), Some(&"false".to_string()));
        assert_eq!(flat.get("process.seed"), Some(&"123".to_string()));
        assert_eq!(flat.get("process.initial_state"), Some(&"0".to_string()));
        assert_eq!(flat.get("process.sigma"), Some(&"10".to_string()));
        assert_eq!(flat.len(), 6);
    }

    #[test]
    fn test_flatten_is_order_stable() {
        let params = SimulationParams::builder(process()).build().unwrap();
        let keys_a: Vec<String> = params.flatten().into_keys().collect();
        let keys_b: Vec<String> = params.flatten().into_keys().collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn test_equal_params_flatten_identically() {
        let a = SimulationParams::builder(process()).build().unwrap();
        let b = SimulationParams::builder(process()).build().unwrap();
        assert_eq!(a.flatten(), b.flatten());
    }
}
