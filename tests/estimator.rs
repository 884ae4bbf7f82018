//! Tests for the visit probability / entropy estimator

use stopcast::{
    estimate_visits, no_stop_only_distribution, shannon_entropy_bits, Candidate, NoStopMode,
    StopcastError,
};

/// A candidate whose dwell band is centered on the given free time, so its
/// z-score is zero and it lands in the innermost band.
fn centered_candidate(id: &str, free_time: f64, weight: f64) -> Candidate {
    Candidate::new(id, free_time - 100.0, free_time + 100.0, weight)
}

#[test]
fn test_include_mode_sums_to_one_with_no_stop() {
    let candidates = vec![
        centered_candidate("a", 600.0, 50.0),
        centered_candidate("b", 600.0, 10.0),
    ];
    let dist = estimate_visits(&candidates, 600.0, 0.3, NoStopMode::IncludeInPool).unwrap();

    let candidate_sum: f64 = dist.per_candidate_probability.iter().sum();
    assert!((candidate_sum + dist.no_stop_probability - 1.0).abs() < 1e-9);

    // Equal bands: probability ratio follows the popularity ratio.
    let ratio = dist.per_candidate_probability[0] / dist.per_candidate_probability[1];
    assert!((ratio - 5.0).abs() < 1e-9);
}

#[test]
fn test_prior_mode_excludes_no_stop_mass() {
    let no_stop = 0.4;
    let candidates = vec![
        centered_candidate("a", 600.0, 25.0),
        centered_candidate("b", 600.0, 75.0),
    ];
    let dist = estimate_visits(&candidates, 600.0, no_stop, NoStopMode::Prior).unwrap();

    let candidate_sum: f64 = dist.per_candidate_probability.iter().sum();
    assert!((candidate_sum - (1.0 - no_stop)).abs() < 1e-9);
    // Diagnostics: the no-stop probability is reported unscaled.
    assert_eq!(dist.no_stop_probability, no_stop);
}

#[test]
fn test_zero_weight_candidate_is_excluded_in_place() {
    let candidates = vec![
        centered_candidate("a", 600.0, 20.0),
        centered_candidate("no-evidence", 600.0, 0.0),
        centered_candidate("c", 600.0, 20.0),
    ];
    let dist = estimate_visits(&candidates, 600.0, 0.1, NoStopMode::Prior).unwrap();

    assert_eq!(dist.per_candidate_probability.len(), 3);
    assert_eq!(dist.per_candidate_probability[1], 0.0);
    assert!(dist.per_candidate_probability[0] > 0.0);
    assert_eq!(
        dist.per_candidate_probability[0],
        dist.per_candidate_probability[2]
    );
}

#[test]
fn test_z_banding_separates_near_and_far_dwell() {
    // Free time of 10 minutes: a short coffee stop is plausible, an
    // all-afternoon visit is not, popularity being equal.
    let candidates = vec![
        Candidate::new("cafe", 500.0, 700.0, 30.0),
        Candidate::new("museum", 7000.0, 9000.0, 30.0),
    ];
    let dist = estimate_visits(&candidates, 600.0, 0.2, NoStopMode::Prior).unwrap();
    // Innermost vs outermost band: 0.341 vs 0.0013.
    let ratio = dist.per_candidate_probability[0] / dist.per_candidate_probability[1];
    assert!((ratio - 0.341 / 0.0013).abs() < 1e-6);
}

#[test]
fn test_degenerate_dwell_interval_synthesized() {
    // min == max == 600: synthesized to [300, 900], mean 600, std 150.
    // Free time at the mean lands in the innermost band.
    let candidates = vec![Candidate::new("spot", 600.0, 600.0, 10.0)];
    let dist = estimate_visits(&candidates, 600.0, 0.0, NoStopMode::Prior).unwrap();
    assert!((dist.per_candidate_probability[0] - 1.0).abs() < 1e-9);
    assert!(dist.entropy_bits.abs() < 1e-12);
}

#[test]
fn test_no_feasible_candidates() {
    let err = estimate_visits(&[], 600.0, 0.5, NoStopMode::Prior).unwrap_err();
    assert!(matches!(
        err,
        StopcastError::NoFeasibleCandidates { candidate_count: 0 }
    ));

    // All-zero weights behave like an empty pool.
    let unweighted = vec![centered_candidate("a", 600.0, 0.0)];
    assert!(matches!(
        estimate_visits(&unweighted, 600.0, 0.5, NoStopMode::Prior),
        Err(StopcastError::NoFeasibleCandidates { candidate_count: 1 })
    ));
}

#[test]
fn test_no_stop_only_fallback() {
    let dist = no_stop_only_distribution(3, 0.87);
    assert_eq!(dist.per_candidate_probability, vec![0.0, 0.0, 0.0]);
    assert_eq!(dist.no_stop_probability, 0.87);
    assert_eq!(dist.entropy_bits, 0.0);
}

// ========================================================================
// Entropy
// ========================================================================

#[test]
fn test_entropy_of_uniform_pool_approaches_log2_k() {
    let k = 8;
    let candidates: Vec<Candidate> = (0..k)
        .map(|i| centered_candidate(&format!("c{i}"), 600.0, 40.0))
        .collect();
    let dist = estimate_visits(&candidates, 600.0, 0.25, NoStopMode::IncludeInPool).unwrap();
    assert!((dist.entropy_bits - (k as f64).log2()).abs() < 1e-9);
}

#[test]
fn test_entropy_of_dominant_candidate_approaches_zero() {
    let candidates = vec![
        centered_candidate("dominant", 600.0, 1_000_000.0),
        centered_candidate("rare", 600.0, 1.0),
    ];
    let dist = estimate_visits(&candidates, 600.0, 0.1, NoStopMode::Prior).unwrap();
    assert!(dist.entropy_bits < 0.001);
}

#[test]
fn test_shannon_entropy_renormalizes_and_skips_zeros() {
    assert!((shannon_entropy_bits(&[0.5, 0.5]) - 1.0).abs() < 1e-12);
    assert!((shannon_entropy_bits(&[2.0, 2.0, 0.0]) - 1.0).abs() < 1e-12);
    assert_eq!(shannon_entropy_bits(&[]), 0.0);
    assert_eq!(shannon_entropy_bits(&[0.0, 0.0]), 0.0);
    assert_eq!(shannon_entropy_bits(&[7.0]), 0.0);
}
