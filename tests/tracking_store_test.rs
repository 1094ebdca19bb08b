//! Store conformance tests: both shipped backends must satisfy the same
//! `TrackingStore` contract the orchestrator depends on.

use std::collections::BTreeMap;

use walkbench::tracking::{
    LocalTrackingStore, MemoryTrackingStore, MetricPoint, RunFilter, RunStatus, TrackingStore,
};

fn params(seed: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("process.seed".to_string(), seed.to_string()),
        ("total_step".to_string(), "1000".to_string()),
    ])
}

fn conformance<S: TrackingStore>(store: &S) {
    // Experiment find-or-create resolves to one handle.
    assert!(store.find_experiment("walks").unwrap().is_none());
    let exp = store.create_experiment("walks").unwrap();
    assert_eq!(store.create_experiment("walks").unwrap(), exp);
    assert_eq!(store.find_experiment("walks").unwrap(), Some(exp.clone()));

    // Open a run, log against it.
    let run_id = store
        .start_run(&exp, Some("first"), &BTreeMap::from([("k".into(), "v".into())]))
        .unwrap();
    store.log_params(&run_id, &params("123")).unwrap();
    store.log_metric(&run_id, "state", 0, 0.0).unwrap();
    store.log_metric(&run_id, "state", 9, -1.5).unwrap();

    let run = store.get_run(&run_id).unwrap().unwrap();
    assert_eq!(run.status(), RunStatus::Running);
    assert_eq!(run.name(), Some("first"));
    assert_eq!(run.tags().get("k"), Some(&"v".to_string()));

    // A running run never satisfies a Finished filter.
    let finished = RunFilter {
        params: params("123"),
        status: Some(RunStatus::Finished),
    };
    assert!(store.search_runs(&exp, &finished, 1).unwrap().is_empty());

    // Artifact round trip plus URI on the snapshot.
    let blob = vec![0u8; 24];
    store.log_artifact(&run_id, "state_trajectory.bin", &blob).unwrap();
    assert_eq!(
        store.fetch_artifact(&run_id, "state_trajectory.bin").unwrap(),
        Some(blob)
    );
    assert_eq!(store.fetch_artifact(&run_id, "absent.bin").unwrap(), None);
    assert!(store.get_run(&run_id).unwrap().unwrap().artifact_uri().is_some());

    // Finish once; the finished run becomes searchable by exact params.
    store.finish_run(&run_id).unwrap();
    assert!(store.finish_run(&run_id).is_err());
    let found = store.search_runs(&exp, &finished, 1).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].run_id(), run_id);

    // Format-differing values do not match.
    let mismatched = RunFilter {
        params: params("123.0"),
        status: Some(RunStatus::Finished),
    };
    assert!(store.search_runs(&exp, &mismatched, 1).unwrap().is_empty());

    // Metric history is ordered by step.
    let history = store.metric_history(&run_id, "state").unwrap();
    let steps: Vec<u64> = history.iter().map(MetricPoint::step).collect();
    assert_eq!(steps, vec![0, 9]);

    // Unknown runs are rejected.
    assert!(store.log_params("missing", &BTreeMap::new()).is_err());
    assert!(store.finish_run("missing").is_err());
}

#[test]
fn test_memory_store_conformance() {
    let store = MemoryTrackingStore::new();
    conformance(&store);
}

#[test]
fn test_local_store_conformance() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = LocalTrackingStore::open(dir.path().join("tracking")).unwrap();
    conformance(&store);
}

#[test]
fn test_stores_are_shareable_across_threads() {
    let store = MemoryTrackingStore::new();
    let exp = store.create_experiment("parallel").unwrap();

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let (store, exp) = (&store, &exp);
            scope.spawn(move || {
                // Racing create resolves to the same experiment.
                assert_eq!(store.create_experiment("parallel").unwrap(), *exp);
                let run_id = store
                    .start_run(exp, Some(&format!("worker-{worker}")), &BTreeMap::new())
                    .unwrap();
                store.log_metric(&run_id, "state", 0, f64::from(worker)).unwrap();
                store.finish_run(&run_id).unwrap();
            });
        }
    });

    let all = store
        .search_runs(
            &exp,
            &RunFilter {
                params: BTreeMap::new(),
                status: Some(RunStatus::Finished),
            },
            10,
        )
        .unwrap();
    assert_eq!(all.len(), 4);
}
