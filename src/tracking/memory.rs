//! In-memory tracking store backed by `DashMap`
//!
//! The default store for tests and single-process sweeps. Thread-safe;
//! data is lost on process exit. For persistence across processes use
//! [`LocalTrackingStore`](super::LocalTrackingStore).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::{MetricPoint, RunFilter, RunSnapshot, RunStatus, TrackingStore};
use crate::{Error, Result};

/// Thread-safe in-memory tracking store.
///
/// Experiment creation uses the `DashMap` entry API, so two workers racing
/// to create the same name both end up with the same experiment ID.
#[derive(Debug, Default)]
pub struct MemoryTrackingStore {
    experiments: DashMap<String, String>,
    runs: DashMap<String, RunSnapshot>,
    metrics: DashMap<String, Vec<MetricPoint>>,
    artifacts: DashMap<String, Vec<u8>>,
    next_id: AtomicU64,
}

impl MemoryTrackingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs ever started against this store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn allocate_id(&self, prefix: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{id}")
    }

    fn metric_key(run_id: &str, key: &str) -> String {
        format!("{run_id}/{key}")
    }

    fn artifact_key(run_id: &str, name: &str) -> String {
        format!("{run_id}/{name}")
    }

    fn with_run<T>(&self, run_id: &str, f: impl FnOnce(&mut RunSnapshot) -> Result<T>) -> Result<T> {
        let mut run = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::Tracking(format!("unknown run '{run_id}'")))?;
        f(run.value_mut())
    }
}

impl TrackingStore for MemoryTrackingStore {
    fn find_experiment(&self, name: &str) -> Result<Option<String>> {
        Ok(self.experiments.get(name).map(|id| id.value().clone()))
    }

    fn create_experiment(&self, name: &str) -> Result<String> {
        let id = self
            .experiments
            .entry(name.to_string())
            .or_insert_with(|| self.allocate_id("exp"))
            .value()
            .clone();
        Ok(id)
    }

    fn start_run(
        &self,
        experiment_id: &str,
        name: Option<&str>,
        tags: &BTreeMap<String, String>,
    ) -> Result<String> {
        let run_id = self.allocate_id("run");
        let run = RunSnapshot::new(
            run_id.clone(),
            experiment_id,
            name.map(ToString::to_string),
            tags.clone(),
        );
        self.runs.insert(run_id.clone(), run);
        Ok(run_id)
    }

    fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        self.with_run(run_id, |run| {
            run.set_params(params);
            Ok(())
        })
    }

    fn log_metric(&self, run_id: &str, key: &str, step: u64, value: f64) -> Result<()> {
        if !self.runs.contains_key(run_id) {
            return Err(Error::Tracking(format!("unknown run '{run_id}'")));
        }
        self.metrics
            .entry(Self::metric_key(run_id, key))
            .or_default()
            .push(MetricPoint::new(step, value));
        Ok(())
    }

    fn finish_run(&self, run_id: &str) -> Result<()> {
        self.with_run(run_id, |run| {
            if run.status() != RunStatus::Running {
                return Err(Error::Tracking(format!(
                    "run '{run_id}' already terminated as {:?}",
                    run.status()
                )));
            }
            run.terminate(RunStatus::Finished);
            Ok(())
        })
    }

    fn fail_run(&self, run_id: &str) -> Result<()> {
        self.with_run(run_id, |run| {
            if run.status() == RunStatus::Running {
                run.terminate(RunStatus::Failed);
            }
            Ok(())
        })
    }

    fn get_run(&self, run_id: &str) -> Result<Option<RunSnapshot>> {
        Ok(self.runs.get(run_id).map(|run| run.value().clone()))
    }

    fn search_runs(
        &self,
        experiment_id: &str,
        filter: &RunFilter,
        limit: usize,
    ) -> Result<Vec<RunSnapshot>> {
        Ok(self
            .runs
            .iter()
            .filter(|entry| entry.value().experiment_id() == experiment_id)
            .filter(|entry| filter.matches(entry.value()))
            .take(limit)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn metric_history(&self, run_id: &str, key: &str) -> Result<Vec<MetricPoint>> {
        let mut points = self
            .metrics
            .get(&Self::metric_key(run_id, key))
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        points.sort_by_key(MetricPoint::step);
        Ok(points)
    }

    fn log_artifact(&self, run_id: &str, name: &str, bytes: &[u8]) -> Result<String> {
        let uri = format!("memory://{}", Self::artifact_key(run_id, name));
        self.with_run(run_id, |run| {
            run.set_artifact_uri(uri.clone());
            Ok(())
        })?;
        self.artifacts
            .insert(Self::artifact_key(run_id, name), bytes.to_vec());
        Ok(uri)
    }

    fn fetch_artifact(&self, run_id: &str, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .artifacts
            .get(&Self::artifact_key(run_id, name))
            .map(|entry| entry.value().clone()))
    }
}
