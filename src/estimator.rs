//! Destination visit probability and entropy estimation.
//!
//! Turns a set of candidate destinations (dwell-time interval + popularity
//! weight) and the free time left inside a tracking window into a
//! normalized visit-probability distribution, then scores the residual
//! uncertainty as Shannon entropy in bits. Low entropy means one
//! destination dominates; entropy near `log2(candidate count)` means the
//! evidence cannot tell the destinations apart.

use log::{info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, StopcastError};
use crate::feasibility::{feasibility, no_stop_probability};
use crate::{Candidate, TripDuration, VisitDistribution};

/// How the no-stop probability is folded into the distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoStopMode {
    /// Append the no-stop probability to the weighted pool and normalize
    /// everything together; candidate probabilities and the no-stop share
    /// then sum to one.
    IncludeInPool,
    /// Normalize candidates among themselves, then scale each by
    /// `1 - no_stop_probability`; the reported no-stop probability stays
    /// unscaled, for diagnostics.
    Prior,
}

/// Visit probability for a z-score under the empirical three-sigma rule.
///
/// A coarse banded approximation of the Gaussian CDF, chosen for speed and
/// stability over exact erf evaluation: 68% of mass within one sigma is
/// split over two tails, and so on outward.
pub fn z_band_probability(z: f64) -> f64 {
    let z = z.abs();
    if z <= 1.0 {
        0.341
    } else if z <= 2.0 {
        0.136
    } else if z <= 3.0 {
        0.021
    } else {
        0.0013
    }
}

/// Shannon entropy in bits of a weight vector.
///
/// Weights are renormalized to sum to one before the summation, so callers
/// can pass raw pooled weights or already-normalized probabilities
/// interchangeably. Zero entries contribute nothing (`0 * log2(0)` is taken
/// as 0); an empty or zero-mass vector has zero entropy.
pub fn shannon_entropy_bits(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    weights
        .iter()
        .filter(|&&w| w > 0.0)
        .map(|&w| {
            let p = w / total;
            -p * p.log2()
        })
        .sum()
}

/// Map a reported dwell interval to the (mean, std) of its ±2-sigma band.
///
/// A degenerate interval (min == max) is widened by halving the minimum and
/// scaling the maximum by 1.5 before the mapping; an explicit policy for
/// providers that report a single dwell value rather than a range.
fn dwell_statistics(dwell_min_seconds: f64, dwell_max_seconds: f64) -> (f64, f64) {
    let mut minimum = dwell_min_seconds.abs();
    let mut maximum = dwell_max_seconds.abs();
    if minimum == maximum {
        minimum /= 2.0;
        maximum *= 1.5;
    }
    let mean = (minimum + maximum) / 2.0;
    let std = (maximum - minimum) / 4.0;
    (mean, std)
}

/// Estimate the visit distribution over a candidate pool.
///
/// For each candidate the free time is z-scored against the candidate's
/// dwell band, banded into a visit probability, and weighted by popularity.
/// Candidates with non-positive popularity weight are excluded from the
/// pool and report probability 0.0 in their input position. The no-stop
/// probability is folded in according to `mode`, and the entropy of the
/// resulting candidate mass is computed.
///
/// Fails with [`StopcastError::NoFeasibleCandidates`] when the weighted
/// pool ends up empty.
pub fn estimate_visits(
    candidates: &[Candidate],
    free_time_seconds: f64,
    no_stop_probability: f64,
    mode: NoStopMode,
) -> Result<VisitDistribution> {
    let mut weights = vec![0.0f64; candidates.len()];
    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.popularity_weight <= 0.0 {
            // No usable evidence for this candidate.
            continue;
        }
        let (mean, std) = dwell_statistics(candidate.dwell_min_seconds, candidate.dwell_max_seconds);
        let z = (free_time_seconds - mean) / std;
        weights[index] = z_band_probability(z) * candidate.popularity_weight;
    }

    let pool: f64 = weights.iter().sum();
    if pool <= 0.0 {
        return Err(StopcastError::NoFeasibleCandidates {
            candidate_count: candidates.len(),
        });
    }

    let (per_candidate_probability, reported_no_stop) = match mode {
        NoStopMode::IncludeInPool => {
            let total = pool + no_stop_probability;
            let normalized: Vec<f64> = weights.iter().map(|w| w / total).collect();
            (normalized, no_stop_probability / total)
        }
        NoStopMode::Prior => {
            let stop_weight = 1.0 - no_stop_probability;
            let normalized: Vec<f64> = weights.iter().map(|w| w / pool * stop_weight).collect();
            (normalized, no_stop_probability)
        }
    };

    let entropy_bits = shannon_entropy_bits(&per_candidate_probability);

    Ok(VisitDistribution {
        per_candidate_probability,
        no_stop_probability: reported_no_stop,
        entropy_bits,
    })
}

/// The explicit fallback distribution for a trip with no feasible
/// candidates: all probability mass sits on "did not stop".
///
/// Logged as a degraded outcome rather than silently substituted, so the
/// caller's report can distinguish "no destination dominated" from "no
/// destination was reachable at all".
pub fn no_stop_only_distribution(
    candidate_count: usize,
    no_stop_probability: f64,
) -> VisitDistribution {
    warn!("no feasible candidates; reporting a no-stop-only distribution");
    VisitDistribution {
        per_candidate_probability: vec![0.0; candidate_count],
        no_stop_probability,
        entropy_bits: 0.0,
    }
}

/// Estimate the visit distribution for a tracked trip and its candidate
/// destinations, excluding destinations whose own route does not fit the
/// tracking window.
///
/// Each destination pairs a [`Candidate`] with the duration of the route
/// that detours through it. Destinations that fail the feasibility check
/// are excluded upstream of the estimator (their probability reports 0.0 in
/// input order). Fails with [`StopcastError::NoFeasibleCandidates`] when
/// the tracked trip itself does not fit or every destination is excluded.
pub fn estimate_destinations(
    trip: &TripDuration,
    destinations: &[(Candidate, TripDuration)],
    tracking_window_seconds: f64,
    mode: NoStopMode,
) -> Result<VisitDistribution> {
    let trip_feasibility = feasibility(trip, tracking_window_seconds);
    if !trip_feasibility.fits {
        return Err(StopcastError::NoFeasibleCandidates {
            candidate_count: destinations.len(),
        });
    }
    let no_stop = no_stop_probability(trip.total_seconds(), tracking_window_seconds);

    // Zeroing the weight excludes a destination while preserving its slot
    // in the reported distribution.
    let mut in_window = 0usize;
    let candidates: Vec<Candidate> = destinations
        .iter()
        .map(|(candidate, route)| {
            let mut candidate = candidate.clone();
            if feasibility(route, tracking_window_seconds).fits {
                in_window += 1;
            } else {
                candidate.popularity_weight = 0.0;
            }
            candidate
        })
        .collect();
    info!(
        "{in_window} of {} destinations fit the {tracking_window_seconds}s tracking window",
        destinations.len()
    );

    estimate_visits(
        &candidates,
        trip_feasibility.free_time_seconds,
        no_stop,
        mode,
    )
}

/// Estimate several independent trips in parallel. Each query is a tracked
/// trip with its candidate destinations; results are returned in input
/// order, recoverable errors included.
#[cfg(feature = "parallel")]
pub fn estimate_destinations_parallel(
    queries: &[(TripDuration, Vec<(Candidate, TripDuration)>)],
    tracking_window_seconds: f64,
    mode: NoStopMode,
) -> Vec<Result<VisitDistribution>> {
    queries
        .par_iter()
        .map(|(trip, destinations)| {
            estimate_destinations(trip, destinations, tracking_window_seconds, mode)
        })
        .collect()
}
