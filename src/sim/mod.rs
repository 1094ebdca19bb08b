//! Simulation orchestrator
//!
//! Drives a [`BrownianMotion`] process against a tracking store: logs the
//! flattened parameters, samples the state metric on the configured cadence,
//! persists the full trajectory as a binary artifact, and marks the run
//! finished. Before executing, the orchestrator consults the
//! [`RunMemoizer`]; a prior finished run with identical parameters puts the
//! simulator directly into its terminal `done` state and all result
//! accessors read from the store instead.

mod memo;
mod params;

pub use memo::RunMemoizer;
pub use params::{SimulationParams, SimulationParamsBuilder};

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::process::BrownianMotion;
use crate::tracking::{ensure_experiment, MetricPoint, RunSnapshot, TrackingStore};
use crate::trajectory::Trajectory;
use crate::{Error, Result};

/// Metric key under which the walk state is logged.
pub const STATE_METRIC: &str = "state";

/// Artifact name of the serialized full trajectory.
pub const TRAJECTORY_ARTIFACT: &str = "state_trajectory.bin";

/// Optional knobs for a simulator, with chainable setters.
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    run_name: Option<String>,
    run_tags: BTreeMap<String, String>,
    check_previous_runs: bool,
}

impl SimulatorOptions {
    /// Create options with previous-run lookup enabled and no name or tags.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            run_name: None,
            run_tags: BTreeMap::new(),
            check_previous_runs: true,
        }
    }

    /// Set the name given to a newly started run.
    #[must_use]
    pub fn run_name(mut self, name: impl Into<String>) -> Self {
        self.run_name = Some(name.into());
        self
    }

    /// Add a tag attached to a newly started run.
    #[must_use]
    pub fn run_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.run_tags.insert(key.into(), value.into());
        self
    }

    /// Enable or disable the memoization lookup at construction.
    #[must_use]
    pub const fn check_previous_runs(mut self, check: bool) -> Self {
        self.check_previous_runs = check;
        self
    }
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Idempotent simulation-run orchestrator.
///
/// The state machine has two states: unstarted and done. `done` is a
/// one-way terminal flag; once set (either by a memoization hit at
/// construction or by [`run`](Self::run) completing) no re-execution ever
/// happens through this instance.
pub struct Simulator<'a, S: TrackingStore + ?Sized> {
    store: &'a S,
    experiment_id: String,
    params: SimulationParams,
    flattened: BTreeMap<String, String>,
    options: SimulatorOptions,
    process: BrownianMotion,
    done: bool,
    run_id: Option<String>,
    result: Option<RunSnapshot>,
    trajectory: Option<Trajectory>,
}

impl<'a, S: TrackingStore + ?Sized> Simulator<'a, S> {
    /// Create a simulator bound to a tracking store and experiment.
    ///
    /// Finds or creates the named experiment, then (unless disabled in
    /// `options`) searches for a finished run with identical flattened
    /// parameters. On a hit the simulator starts in the terminal `done`
    /// state with `run_id` and result populated from the match.
    ///
    /// # Errors
    ///
    /// Propagates store failures from the experiment lookup and the
    /// memoization query.
    pub fn new(
        store: &'a S,
        experiment_name: &str,
        params: SimulationParams,
        options: SimulatorOptions,
    ) -> Result<Self> {
        let experiment_id = ensure_experiment(store, experiment_name)?;
        let flattened = params.flatten();
        let process = BrownianMotion::with_options(
            params.process(),
            params.save_full_trajectory(),
            Some(params.total_step()),
        )?;

        let mut simulator = Self {
            store,
            experiment_id,
            params,
            flattened,
            options,
            process,
            done: false,
            run_id: None,
            result: None,
            trajectory: None,
        };

        if simulator.options.check_previous_runs {
            let memoizer = RunMemoizer::new(store, simulator.experiment_id.clone());
            if let Some(found) = memoizer.find_matching_run(&simulator.flattened)? {
                info!(
                    run_id = found.run_id(),
                    "matching finished run found, skipping execution"
                );
                simulator.run_id = Some(found.run_id().to_string());
                simulator.result = Some(found);
                simulator.done = true;
            }
        }

        Ok(simulator)
    }

    /// Whether the simulator is in its terminal state.
    #[must_use]
    pub const fn done(&self) -> bool {
        self.done
    }

    /// Get the run ID, once known.
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Get the experiment ID this simulator is bound to.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the run snapshot backing the results, once known.
    #[must_use]
    pub const fn result(&self) -> Option<&RunSnapshot> {
        self.result.as_ref()
    }

    /// Get the simulation parameters.
    #[must_use]
    pub const fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Execute the simulation once.
    ///
    /// No-op when already `done`. Otherwise opens a run, logs params and
    /// the step-0 state, then advances the process `total_step` times,
    /// logging the state at every step whose index satisfies
    /// `step % record_per == record_per - 1`. With full-trajectory capture
    /// the buffer is persisted as the `state_trajectory.bin` artifact.
    /// The run is finished exactly once at the end; any failure on the way
    /// marks it failed instead, never finished with partial data.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the open run is marked failed before the
    /// error surfaces.
    pub fn run(&mut self) -> Result<()> {
        if self.done {
            info!("simulation already finished");
            return Ok(());
        }

        let run_id = self.store.start_run(
            &self.experiment_id,
            self.options.run_name.as_deref(),
            &self.options.run_tags,
        )?;
        info!(run_id = %run_id, params = ?self.flattened, "starting run");

        let guard = RunGuard::new(self.store, &run_id);
        self.store.log_params(&run_id, &self.flattened)?;
        self.store
            .log_metric(&run_id, STATE_METRIC, 0, self.process.state())?;

        let record_per = self.params.record_per();
        for step in 1..=self.params.total_step() {
            let state = self.process.step();
            if step % record_per == record_per - 1 {
                self.store.log_metric(&run_id, STATE_METRIC, step, state)?;
            }
        }

        if self.params.save_full_trajectory() {
            // Capture is enabled whenever save_full_trajectory is set.
            if let Some(trajectory) = self.process.take_trajectory() {
                let uri =
                    self.store
                        .log_artifact(&run_id, TRAJECTORY_ARTIFACT, &trajectory.to_bytes())?;
                info!(run_id = %run_id, uri = %uri, "trajectory artifact stored");
                self.trajectory = Some(trajectory);
            }
        }

        guard.finish()?;
        info!(run_id = %run_id, "run finished");

        self.result = self.store.get_run(&run_id)?;
        self.run_id = Some(run_id);
        self.done = true;
        Ok(())
    }

    /// Fetch the sampled metric history of the state, ordered by step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] before a run identity is known (no
    /// memoization hit and [`run`](Self::run) not yet completed).
    pub fn get_metric_history(&self) -> Result<Vec<MetricPoint>> {
        let run_id = self.run_id.as_deref().ok_or(Error::NotReady)?;
        self.store.metric_history(run_id, STATE_METRIC)
    }

    /// Get the full state trajectory, cached-or-fetched.
    ///
    /// Returns the in-memory buffer when this instance executed the run;
    /// otherwise fetches the trajectory artifact from the store, decodes
    /// it, caches it, and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] before a run identity is known,
    /// [`Error::ArtifactNotFound`] when the blob is absent at its expected
    /// location, [`Error::MalformedArtifact`] when it cannot be decoded.
    pub fn get_state_trajectory(&mut self) -> Result<&Trajectory> {
        if self.trajectory.is_none() {
            let run_id = self.run_id.clone().ok_or(Error::NotReady)?;
            let bytes = self
                .store
                .fetch_artifact(&run_id, TRAJECTORY_ARTIFACT)?
                .ok_or_else(|| Error::ArtifactNotFound {
                    run_id: run_id.clone(),
                    name: TRAJECTORY_ARTIFACT.to_string(),
                })?;
            self.trajectory = Some(Trajectory::from_bytes(&bytes)?);
        }
        // Populated by the branch above or by run().
        self.trajectory.as_ref().ok_or(Error::NotReady)
    }
}

/// Scoped acquisition of an open run: unless explicitly finished, the run
/// is marked failed on drop so it can never be observed as FINISHED with
/// partial data.
struct RunGuard<'a, S: TrackingStore + ?Sized> {
    store: &'a S,
    run_id: &'a str,
    armed: bool,
}

impl<'a, S: TrackingStore + ?Sized> RunGuard<'a, S> {
    const fn new(store: &'a S, run_id: &'a str) -> Self {
        Self {
            store,
            run_id,
            armed: true,
        }
    }

    fn finish(mut self) -> Result<()> {
        self.store.finish_run(self.run_id)?;
        self.armed = false;
        Ok(())
    }
}

impl<S: TrackingStore + ?Sized> Drop for RunGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(error) = self.store.fail_run(self.run_id) {
            warn!(run_id = self.run_id, %error, "could not mark abandoned run as failed");
        } else {
            warn!(run_id = self.run_id, "run abandoned, marked failed");
        }
    }
}
