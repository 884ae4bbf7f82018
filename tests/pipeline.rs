//! End-to-end scenario: trace -> segments -> feasibility -> distribution

use stopcast::{
    estimate_destinations, no_stop_only_distribution, segment_trace, Candidate, NoStopMode,
    SegmentationPolicy, StopcastError, TraceSample, TripDuration,
};

#[test]
fn test_trace_to_visit_distribution() {
    // A busy taxi tracked over 15 minutes, sampled irregularly.
    let trace: Vec<TraceSample> = [0, 100, 250, 400, 900]
        .iter()
        .enumerate()
        .map(|(i, &t)| TraceSample::new(60.17 + i as f64 * 1e-3, 24.94, true, t))
        .collect();

    let segments = segment_trace(
        trace,
        &SegmentationPolicy::TimeInterval {
            interval_seconds: 200,
        },
    )
    .unwrap();
    assert_eq!(segments.len(), 2);
    assert!(!segments[0].encoded_path.is_empty());

    // An external routing collaborator reports a 20-minute trip for the
    // first segment's endpoints, plus per-destination detour durations.
    let trip = TripDuration::single(1200.0);
    let window = 600.0;
    let destinations = vec![
        (
            // Dwell band centered on the 250 s of free time.
            Candidate::new("kiosk", 150.0, 350.0, 80.0),
            TripDuration::single(1300.0),
        ),
        (
            Candidate::new("mall", 1800.0, 5400.0, 900.0),
            TripDuration::single(1350.0),
        ),
        (
            // Too far out of the way: its own route misses the window.
            Candidate::new("detour", 150.0, 350.0, 500.0),
            TripDuration::single(7200.0),
        ),
    ];

    let dist =
        estimate_destinations(&trip, &destinations, window, NoStopMode::IncludeInPool).unwrap();

    assert_eq!(dist.per_candidate_probability.len(), 3);
    // The infeasible detour is excluded in place.
    assert_eq!(dist.per_candidate_probability[2], 0.0);
    // The kiosk's dwell band matches the free time; the mall's does not,
    // and popularity cannot close a three-sigma gap.
    assert!(dist.per_candidate_probability[0] > dist.per_candidate_probability[1]);

    let total: f64 =
        dist.per_candidate_probability.iter().sum::<f64>() + dist.no_stop_probability;
    assert!((total - 1.0).abs() < 1e-9);

    // Two live candidates: uncertainty stays below one bit.
    assert!(dist.entropy_bits > 0.0);
    assert!(dist.entropy_bits < 1.0);
}

#[test]
fn test_unreachable_trip_reports_no_feasible_candidates() {
    let trip = TripDuration::single(7200.0); // min ~2104 s, window 600 s
    let destinations = vec![(
        Candidate::new("anywhere", 300.0, 900.0, 10.0),
        TripDuration::single(7300.0),
    )];

    let err = estimate_destinations(&trip, &destinations, 600.0, NoStopMode::Prior).unwrap_err();
    assert!(matches!(err, StopcastError::NoFeasibleCandidates { .. }));

    // The caller's explicit degraded path: report no-stop-only.
    let fallback = no_stop_only_distribution(destinations.len(), 0.99);
    assert_eq!(fallback.per_candidate_probability, vec![0.0]);
    assert_eq!(fallback.entropy_bits, 0.0);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_destination_batch_matches_serial() {
    // Trips 900..3600 s against a 600 s window: the longer ones fail
    // feasibility, so the batch mixes Ok and Err results.
    let queries: Vec<(TripDuration, Vec<(Candidate, TripDuration)>)> = (1..=4)
        .map(|k| {
            let trip = TripDuration::single(900.0 * k as f64);
            let destinations = vec![
                (
                    Candidate::new("a", 150.0, 350.0, 40.0),
                    TripDuration::single(1000.0),
                ),
                (
                    Candidate::new("b", 150.0, 350.0, 10.0),
                    TripDuration::single(1100.0),
                ),
            ];
            (trip, destinations)
        })
        .collect();

    let parallel =
        stopcast::estimate_destinations_parallel(&queries, 600.0, NoStopMode::Prior);
    assert_eq!(parallel.len(), queries.len());

    for ((trip, destinations), batched) in queries.iter().zip(&parallel) {
        let serial = estimate_destinations(trip, destinations, 600.0, NoStopMode::Prior);
        match (serial, batched) {
            (Ok(expected), Ok(actual)) => assert_eq!(&expected, actual),
            (Err(_), Err(_)) => {}
            (expected, actual) => {
                panic!("parallel result diverged from serial: {expected:?} vs {actual:?}")
            }
        }
    }
}

#[test]
fn test_all_destinations_excluded_is_recoverable() {
    let trip = TripDuration::single(1200.0);
    // The only destination's own route blows the window.
    let destinations = vec![(
        Candidate::new("far", 300.0, 900.0, 10.0),
        TripDuration::single(7200.0),
    )];

    let err = estimate_destinations(&trip, &destinations, 600.0, NoStopMode::Prior).unwrap_err();
    assert!(matches!(
        err,
        StopcastError::NoFeasibleCandidates { candidate_count: 1 }
    ));
}
