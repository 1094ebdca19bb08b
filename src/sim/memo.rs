//! Run memoization - finding a prior finished run with identical parameters

use std::collections::BTreeMap;

use crate::tracking::{RunFilter, RunSnapshot, RunStatus, TrackingStore};
use crate::Result;

/// Looks up previously finished runs by exact parameter equality.
///
/// The query is a conjunction of string-equality predicates over every
/// flattened parameter, restricted to Finished runs, with at most one
/// result requested. If several finished runs share the parameters, any one
/// of them may be returned.
#[derive(Debug)]
pub struct RunMemoizer<'a, S: TrackingStore + ?Sized> {
    store: &'a S,
    experiment_id: String,
}

impl<'a, S: TrackingStore + ?Sized> RunMemoizer<'a, S> {
    /// Create a memoizer scoped to one experiment.
    pub fn new(store: &'a S, experiment_id: impl Into<String>) -> Self {
        Self {
            store,
            experiment_id: experiment_id.into(),
        }
    }

    /// Find a finished run whose logged params equal `flattened` exactly.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn find_matching_run(
        &self,
        flattened: &BTreeMap<String, String>,
    ) -> Result<Option<RunSnapshot>> {
        let filter = RunFilter {
            params: flattened.clone(),
            status: Some(RunStatus::Finished),
        };
        let mut matches = self.store.search_runs(&self.experiment_id, &filter, 1)?;
        Ok(matches.pop())
    }
}
