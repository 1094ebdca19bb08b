//! Tracking store interface and reference implementations
//!
//! The simulator treats the tracking service as an external collaborator
//! behind the [`TrackingStore`] trait: create or find an experiment, open a
//! run, log params and metrics against it, attach a binary artifact, and
//! query finished runs by exact parameter equality. Two implementations ship
//! in-crate: [`MemoryTrackingStore`] (thread-safe, ephemeral) and
//! [`LocalTrackingStore`] (a directory of JSON records and raw blob files,
//! persistent across processes).

mod fs;
mod memory;
mod metric;
mod run;

pub use fs::LocalTrackingStore;
pub use memory::MemoryTrackingStore;
pub use metric::MetricPoint;
pub use run::{RunSnapshot, RunStatus};

use std::collections::BTreeMap;

use crate::Result;

/// Exact-match query over runs: every parameter predicate must hold as a
/// string comparison, and the status must match when given.
///
/// Values are compared as strings, never parsed: `"1"` and `"1.0"` are
/// different values even though they are numerically equal.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    /// Conjunction of `param == value` predicates over flattened params.
    pub params: BTreeMap<String, String>,
    /// Required run status, if any.
    pub status: Option<RunStatus>,
}

impl RunFilter {
    /// Whether a run snapshot satisfies every predicate of this filter.
    #[must_use]
    pub fn matches(&self, run: &RunSnapshot) -> bool {
        if let Some(status) = self.status {
            if run.status() != status {
                return false;
            }
        }
        self.params
            .iter()
            .all(|(key, value)| run.params().get(key) == Some(value))
    }
}

/// Narrow interface onto an experiment-tracking service.
///
/// Implementations must be usable from multiple threads (`Sync`) so that
/// independent parameter tuples can be simulated in parallel against one
/// shared store. `create_experiment` must tolerate concurrent creation of
/// the same name and resolve it to a single usable experiment ID.
pub trait TrackingStore: Sync {
    /// Look up an experiment ID by name.
    fn find_experiment(&self, name: &str) -> Result<Option<String>>;

    /// Create an experiment, or return the existing ID if the name is taken.
    fn create_experiment(&self, name: &str) -> Result<String>;

    /// Open a new run in Running status and return its ID.
    fn start_run(
        &self,
        experiment_id: &str,
        name: Option<&str>,
        tags: &BTreeMap<String, String>,
    ) -> Result<String>;

    /// Log a flattened parameter mapping against a run.
    fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()>;

    /// Log one metric sample against a run.
    fn log_metric(&self, run_id: &str, key: &str, step: u64, value: f64) -> Result<()>;

    /// Transition a run to Finished.
    fn finish_run(&self, run_id: &str) -> Result<()>;

    /// Transition a run to Failed (abandoned before completion).
    fn fail_run(&self, run_id: &str) -> Result<()>;

    /// Fetch a run snapshot by ID.
    fn get_run(&self, run_id: &str) -> Result<Option<RunSnapshot>>;

    /// Query runs of an experiment by exact-match filter, returning at most
    /// `limit` snapshots. No ordering is guaranteed among multiple matches.
    fn search_runs(
        &self,
        experiment_id: &str,
        filter: &RunFilter,
        limit: usize,
    ) -> Result<Vec<RunSnapshot>>;

    /// Fetch the metric history for a run and key, ordered by step ascending.
    fn metric_history(&self, run_id: &str, key: &str) -> Result<Vec<MetricPoint>>;

    /// Attach a named binary artifact to a run and return its locator.
    fn log_artifact(&self, run_id: &str, name: &str, bytes: &[u8]) -> Result<String>;

    /// Fetch a named artifact's bytes, or `None` if absent.
    fn fetch_artifact(&self, run_id: &str, name: &str) -> Result<Option<Vec<u8>>>;
}

/// Find an experiment by name, creating it if missing.
///
/// The benign race where two workers create the same name concurrently is
/// absorbed by `create_experiment`'s find-or-create contract.
///
/// # Errors
///
/// Propagates store failures.
pub fn ensure_experiment<S: TrackingStore + ?Sized>(store: &S, name: &str) -> Result<String> {
    match store.find_experiment(name)? {
        Some(experiment_id) => Ok(experiment_id),
        None => store.create_experiment(name),
    }
}
