//! Run snapshot - one tracked execution of a parameter set

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is currently executing.
    Running,
    /// Run completed successfully. Terminal; set exactly once.
    Finished,
    /// Run was abandoned before completion. Terminal.
    Failed,
}

/// Snapshot of a tracked run as persisted by a tracking store.
///
/// The flattened parameter mapping carried here is the memoization key:
/// a finished run whose params equal a new simulation's flattened params
/// lets the new simulation skip execution entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSnapshot {
    run_id: String,
    experiment_id: String,
    name: Option<String>,
    status: RunStatus,
    params: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    artifact_uri: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl RunSnapshot {
    /// Create a new snapshot in Running status, started now.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        experiment_id: impl Into<String>,
        name: Option<String>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            experiment_id: experiment_id.into(),
            name,
            status: RunStatus::Running,
            params: BTreeMap::new(),
            tags,
            artifact_uri: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the run name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the logged (flattened) parameters.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Get the run tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Get the artifact locator, if an artifact was logged.
    #[must_use]
    pub fn artifact_uri(&self) -> Option<&str> {
        self.artifact_uri.as_deref()
    }

    /// Get the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Get the end timestamp, if the run has terminated.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Merge parameters into the snapshot.
    pub fn set_params(&mut self, params: &BTreeMap<String, String>) {
        self.params
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Record the artifact locator.
    pub fn set_artifact_uri(&mut self, uri: impl Into<String>) {
        self.artifact_uri = Some(uri.into());
    }

    /// Transition to a terminal status, stamping the end time.
    pub fn terminate(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }
}
