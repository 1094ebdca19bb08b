//! Brownian motion - a seeded discrete-time random walk
//!
//! The generator stack is pinned so that determinism is well defined:
//! `ChaCha12Rng::seed_from_u64(seed)` supplies the bits and
//! `rand_distr::StandardNormal` (ziggurat transform) turns them into
//! standard-normal increments. Two processes built from equal parameters
//! produce bit-identical state sequences.

mod params;

pub use params::ProcessParams;

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::trajectory::Trajectory;
use crate::{Error, Result};

/// Discrete-time Brownian motion: `state_{n+1} = state_n + sigma * eps_n`
/// with `eps_n ~ N(0, 1)` drawn from the pinned seeded generator.
///
/// The state is owned exclusively by the process and mutated only through
/// [`step`](Self::step).
#[derive(Debug, Clone)]
pub struct BrownianMotion {
    state: f64,
    sigma: f64,
    rng: ChaCha12Rng,
    trajectory: Option<Trajectory>,
}

impl BrownianMotion {
    /// Create a process without trajectory capture.
    #[must_use]
    pub fn new(params: ProcessParams) -> Self {
        Self {
            state: params.initial_state(),
            sigma: params.sigma(),
            rng: ChaCha12Rng::seed_from_u64(params.seed()),
            trajectory: None,
        }
    }

    /// Create a process that records every state into a pre-allocated
    /// trajectory buffer of length `total_step + 1`, with the initial state
    /// stored at index 0.
    #[must_use]
    pub fn with_capture(params: ProcessParams, total_step: u64) -> Self {
        let mut trajectory = Trajectory::with_step_count(total_step);
        trajectory.push(params.initial_state());
        Self {
            state: params.initial_state(),
            sigma: params.sigma(),
            rng: ChaCha12Rng::seed_from_u64(params.seed()),
            trajectory: Some(trajectory),
        }
    }

    /// Create a process with capture decided at runtime.
    ///
    /// Capture needs the total step count up front to pre-allocate the
    /// trajectory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `save_full_trajectory` is set
    /// without a `total_step` bound.
    pub fn with_options(
        params: ProcessParams,
        save_full_trajectory: bool,
        total_step: Option<u64>,
    ) -> Result<Self> {
        if !save_full_trajectory {
            return Ok(Self::new(params));
        }
        total_step.map_or_else(
            || {
                Err(Error::InvalidParameter(
                    "total_step is required when save_full_trajectory is enabled".into(),
                ))
            },
            |bound| Ok(Self::with_capture(params, bound)),
        )
    }

    /// Get the current state.
    #[must_use]
    pub const fn state(&self) -> f64 {
        self.state
    }

    /// Whether full-trajectory capture is enabled.
    #[must_use]
    pub const fn captures_trajectory(&self) -> bool {
        self.trajectory.is_some()
    }

    /// Get the captured trajectory so far, if capture is enabled.
    #[must_use]
    pub const fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    /// Take ownership of the captured trajectory, disabling further capture.
    #[must_use]
    pub fn take_trajectory(&mut self) -> Option<Trajectory> {
        self.trajectory.take()
    }

    /// Advance one step and return the new state.
    ///
    /// Draws one standard-normal increment from the seeded generator and
    /// moves the state by `sigma` times the draw. Not idempotent: every call
    /// consumes generator state.
    pub fn step(&mut self) -> f64 {
        let eps: f64 = StandardNormal.sample(&mut self.rng);
        self.state += self.sigma * eps;
        if let Some(trajectory) = &mut self.trajectory {
            trajectory.push(self.state);
        }
        self.state
    }
}
