//! Process-level tests: parameter validation, determinism, linearity, and
//! trajectory capture, mirroring the guarantees the orchestrator relies on.

use walkbench::process::{BrownianMotion, ProcessParams};
use walkbench::Error;

const SCENARIOS: &[(u64, f64, f64)] = &[(123, 0.0, 10.0), (456, -2.0, 1.0)];

// =============================================================================
// Parameter validation
// =============================================================================

#[test]
fn test_negative_sigma_fails() {
    let err = ProcessParams::new(123, 0.0, -1.0).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[test]
fn test_capture_without_bound_fails() {
    let params = ProcessParams::new(123, 0.0, 10.0).unwrap();
    let err = BrownianMotion::with_options(params, true, None).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[test]
fn test_no_capture_needs_no_bound() {
    let params = ProcessParams::new(123, 0.0, 10.0).unwrap();
    let bm = BrownianMotion::with_options(params, false, None).unwrap();
    assert!(!bm.captures_trajectory());
}

// =============================================================================
// Determinism under the pinned generator
// =============================================================================

#[test]
fn test_identical_params_identical_sequences() {
    for &(seed, initial_state, sigma) in SCENARIOS {
        let params = ProcessParams::new(seed, initial_state, sigma).unwrap();
        let mut a = BrownianMotion::new(params);
        let mut b = BrownianMotion::new(params);
        for step in 0..1000 {
            let (sa, sb) = (a.step(), b.step());
            assert!(
                sa.to_bits() == sb.to_bits(),
                "sequences diverge at step {step}: {sa} vs {sb}"
            );
        }
    }
}

#[test]
fn test_capture_matches_stepped_states() {
    for &(seed, initial_state, sigma) in SCENARIOS {
        let params = ProcessParams::new(seed, initial_state, sigma).unwrap();
        let mut plain = BrownianMotion::new(params);
        let mut captured = BrownianMotion::with_capture(params, 100);

        let mut states = vec![initial_state];
        for _ in 0..100 {
            states.push(plain.step());
            captured.step();
        }
        assert_eq!(captured.trajectory().unwrap().as_slice(), states.as_slice());
    }
}

// =============================================================================
// Linearity in the initial state
// =============================================================================

#[test]
fn test_trajectory_shift_equals_initial_state_difference() {
    for &(seed, _, _) in SCENARIOS {
        for &(init1, init2) in &[(-10.0, 10.0), (1.0, -10.0), (0.5, 0.25)] {
            for &sigma in &[0.1, 10.0] {
                let mut a =
                    BrownianMotion::new(ProcessParams::new(seed, init1, sigma).unwrap());
                let mut b =
                    BrownianMotion::new(ProcessParams::new(seed, init2, sigma).unwrap());
                for _ in 0..100 {
                    a.step();
                    b.step();
                    assert!(
                        ((a.state() - b.state()) - (init1 - init2)).abs() < 1e-9,
                        "shift broken for seed={seed} sigma={sigma}"
                    );
                }
            }
        }
    }
}
