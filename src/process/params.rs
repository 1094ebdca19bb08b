//! Process parameters - the value-identity key for a random walk

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Parameters of a Brownian-motion process.
///
/// Identity is structural: two parameter sets with the same field values
/// describe the same process, which is what the run memoizer relies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParams {
    seed: u64,
    initial_state: f64,
    sigma: f64,
}

impl ProcessParams {
    /// Create validated process parameters.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed for the pinned random generator
    /// * `initial_state` - State value at step 0
    /// * `sigma` - Noise scale, must be a nonnegative finite number
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `sigma` is negative or NaN.
    pub fn new(seed: u64, initial_state: f64, sigma: f64) -> Result<Self> {
        if sigma < 0.0 || sigma.is_nan() {
            return Err(Error::InvalidParameter(format!(
                "sigma must be nonnegative, got {sigma}"
            )));
        }
        Ok(Self {
            seed,
            initial_state,
            sigma,
        })
    }

    /// Get the generator seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the initial state.
    #[must_use]
    pub const fn initial_state(&self) -> f64 {
        self.initial_state
    }

    /// Get the noise scale.
    #[must_use]
    pub const fn sigma(&self) -> f64 {
        self.sigma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_params() {
        let params = ProcessParams::new(123, 0.0, 10.0).unwrap();
        assert_eq!(params.seed(), 123);
        assert!((params.initial_state() - 0.0).abs() < f64::EPSILON);
        assert!((params.sigma() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_sigma_allowed() {
        assert!(ProcessParams::new(0, 1.5, 0.0).is_ok());
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let err = ProcessParams::new(123, 0.0, -1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_nan_sigma_rejected() {
        assert!(ProcessParams::new(123, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = ProcessParams::new(1, 2.0, 3.0).unwrap();
        let b = ProcessParams::new(1, 2.0, 3.0).unwrap();
        assert_eq!(a, b);
    }
}
