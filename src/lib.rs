//! # Walkbench: Seeded Random-Walk Simulator with Experiment Tracking
//!
//! Walkbench pairs a minimal discrete-time Brownian-motion generator with an
//! experiment-tracking integration that records parameters, per-step metrics,
//! and optional full-trajectory artifacts, and that memoizes finished runs:
//! constructing a simulator with parameters that already have a FINISHED run
//! in the tracking store short-circuits execution and serves results from the
//! store instead of re-stepping.
//!
//! ## Determinism
//!
//! The generator stack is pinned: `ChaCha12Rng` seeded via `seed_from_u64`
//! plus `rand_distr::StandardNormal` (ziggurat). For a fixed seed the state
//! sequence is exactly reproducible across runs and platforms.
//!
//! ## Example
//!
//! ```rust
//! use walkbench::process::ProcessParams;
//! use walkbench::sim::{SimulationParams, Simulator, SimulatorOptions};
//! use walkbench::tracking::MemoryTrackingStore;
//!
//! # fn main() -> walkbench::Result<()> {
//! let store = MemoryTrackingStore::new();
//! let params = SimulationParams::builder(ProcessParams::new(42, 0.0, 1.0)?)
//!     .total_step(100)
//!     .record_per(10)
//!     .build()?;
//!
//! let mut sim = Simulator::new(&store, "demo", params, SimulatorOptions::default())?;
//! sim.run()?;
//!
//! let history = sim.get_metric_history()?;
//! assert_eq!(history.len(), 11); // step 0 plus every matching residue
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod process;
pub mod sim;
pub mod tracking;
pub mod trajectory;

pub use error::{Error, Result};
