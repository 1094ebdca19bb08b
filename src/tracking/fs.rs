//! Filesystem tracking store
//!
//! Persists tracking data as plain files under a root directory, so that a
//! later process pointed at the same root sees earlier finished runs and the
//! memoizer can skip re-execution across process boundaries.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   <experiment_id>/            experiment_id = sanitized name
//!     meta.json                 { experiment_id, name, created_at }
//!     runs/
//!       <run_id>/
//!         run.json              RunSnapshot
//!         metrics/<key>.jsonl   one MetricPoint JSON object per line
//!         artifacts/<name>      raw artifact bytes
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MetricPoint, RunFilter, RunSnapshot, RunStatus, TrackingStore};
use crate::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
struct ExperimentMeta {
    experiment_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

/// Tracking store rooted at a local directory.
///
/// Experiment IDs are derived from the experiment name, which makes
/// `create_experiment` naturally idempotent: two workers racing to create
/// the same name both resolve to the same directory.
#[derive(Debug)]
pub struct LocalTrackingStore {
    root: PathBuf,
    run_counter: AtomicU64,
}

impl LocalTrackingStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the root directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            run_counter: AtomicU64::new(0),
        })
    }

    /// Get the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sanitize(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn experiment_dir(&self, experiment_id: &str) -> PathBuf {
        self.root.join(experiment_id)
    }

    fn allocate_run_id(&self) -> String {
        let counter = self.run_counter.fetch_add(1, Ordering::Relaxed);
        format!("{:x}-{counter}", Utc::now().timestamp_micros())
    }

    /// Locate the directory of a run by scanning the experiments.
    fn run_dir(&self, run_id: &str) -> Result<Option<PathBuf>> {
        for entry in fs::read_dir(&self.root)? {
            let candidate = entry?.path().join("runs").join(run_id);
            if candidate.is_dir() {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn require_run_dir(&self, run_id: &str) -> Result<PathBuf> {
        self.run_dir(run_id)?
            .ok_or_else(|| Error::Tracking(format!("unknown run '{run_id}'")))
    }

    fn read_run(dir: &Path) -> Result<RunSnapshot> {
        let json = fs::read_to_string(dir.join("run.json"))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_run(dir: &Path, run: &RunSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(run)?;
        fs::write(dir.join("run.json"), json)?;
        Ok(())
    }

    fn update_run(
        &self,
        run_id: &str,
        f: impl FnOnce(&mut RunSnapshot) -> Result<()>,
    ) -> Result<()> {
        let dir = self.require_run_dir(run_id)?;
        let mut run = Self::read_run(&dir)?;
        f(&mut run)?;
        Self::write_run(&dir, &run)
    }
}

impl TrackingStore for LocalTrackingStore {
    fn find_experiment(&self, name: &str) -> Result<Option<String>> {
        let experiment_id = Self::sanitize(name);
        let meta = self.experiment_dir(&experiment_id).join("meta.json");
        Ok(meta.is_file().then_some(experiment_id))
    }

    fn create_experiment(&self, name: &str) -> Result<String> {
        let experiment_id = Self::sanitize(name);
        let dir = self.experiment_dir(&experiment_id);
        fs::create_dir_all(dir.join("runs"))?;
        let meta_path = dir.join("meta.json");
        if !meta_path.is_file() {
            let meta = ExperimentMeta {
                experiment_id: experiment_id.clone(),
                name: name.to_string(),
                created_at: Utc::now(),
            };
            fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)?;
        }
        Ok(experiment_id)
    }

    fn start_run(
        &self,
        experiment_id: &str,
        name: Option<&str>,
        tags: &BTreeMap<String, String>,
    ) -> Result<String> {
        let runs_dir = self.experiment_dir(experiment_id).join("runs");
        if !runs_dir.is_dir() {
            return Err(Error::Tracking(format!(
                "unknown experiment '{experiment_id}'"
            )));
        }
        let run_id = self.allocate_run_id();
        let dir = runs_dir.join(&run_id);
        fs::create_dir_all(dir.join("metrics"))?;
        fs::create_dir_all(dir.join("artifacts"))?;
        let run = RunSnapshot::new(
            run_id.clone(),
            experiment_id,
            name.map(ToString::to_string),
            tags.clone(),
        );
        Self::write_run(&dir, &run)?;
        Ok(run_id)
    }

    fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        self.update_run(run_id, |run| {
            run.set_params(params);
            Ok(())
        })
    }

    fn log_metric(&self, run_id: &str, key: &str, step: u64, value: f64) -> Result<()> {
        let dir = self.require_run_dir(run_id)?;
        let path = dir.join("metrics").join(format!("{}.jsonl", Self::sanitize(key)));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(&MetricPoint::new(step, value))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn finish_run(&self, run_id: &str) -> Result<()> {
        self.update_run(run_id, |run| {
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
        self.update_run(run_id, |run| {
            if run.status() == RunStatus::Running {
                run.terminate(RunStatus::Failed);
            }
            Ok(())
        })
    }

    fn get_run(&self, run_id: &str) -> Result<Option<RunSnapshot>> {
        match self.run_dir(run_id)? {
            Some(dir) => Ok(Some(Self::read_run(&dir)?)),
            None => Ok(None),
        }
    }

    fn search_runs(
        &self,
        experiment_id: &str,
        filter: &RunFilter,
        limit: usize,
    ) -> Result<Vec<RunSnapshot>> {
        let runs_dir = self.experiment_dir(experiment_id).join("runs");
        let mut matches = Vec::new();
        if !runs_dir.is_dir() {
            return Ok(matches);
        }
        for entry in fs::read_dir(runs_dir)? {
            if matches.len() >= limit {
                break;
            }
            let dir = entry?.path();
            if !dir.join("run.json").is_file() {
                continue;
            }
            let run = Self::read_run(&dir)?;
            if filter.matches(&run) {
                matches.push(run);
            }
        }
        Ok(matches)
    }

    fn metric_history(&self, run_id: &str, key: &str) -> Result<Vec<MetricPoint>> {
        let dir = self.require_run_dir(run_id)?;
        let path = dir.join("metrics").join(format!("{}.jsonl", Self::sanitize(key)));
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let mut points = Vec::new();
        for line in fs::read_to_string(path)?.lines() {
            if line.trim().is_empty() {
                continue;
            }
            points.push(serde_json::from_str::<MetricPoint>(line)?);
        }
        points.sort_by_key(MetricPoint::step);
        Ok(points)
    }

    fn log_artifact(&self, run_id: &str, name: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.require_run_dir(run_id)?;
        let path = dir.join("artifacts").join(name);
        fs::write(&path, bytes)?;
        let uri = path.display().to_string();
        self.update_run(run_id, |run| {
            run.set_artifact_uri(uri.clone());
            Ok(())
        })?;
        Ok(uri)
    }

    fn fetch_artifact(&self, run_id: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let dir = self.require_run_dir(run_id)?;
        let path = dir.join("artifacts").join(name);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }
}
