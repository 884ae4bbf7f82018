//! Temporal feasibility of trips under a fixed tracking window.
//!
//! Observed travel durations are modeled as lognormal with a fixed
//! log-scale standard deviation taken from the vehicular-mobility
//! literature. Two quantities fall out of the model:
//! - the fastest plausible traversal time (the 3-sigma lower tail), and
//! - the probability that the trip alone exhausts the tracking window,
//!   leaving no time to stop (the survival function at the window).

use log::info;
use statrs::distribution::{ContinuousCDF, LogNormal};

use crate::{FeasibilityResult, TripDuration};

/// Log-scale standard deviation of urban trip completion times. Empirical
/// constant from mobility modeling of taxi fleets.
pub const SIGMA_LN: f64 = 0.41;

/// Fastest plausible traversal time for an observed duration, in whole
/// seconds.
///
/// Evaluates the 3-sigma lower tail of the lognormal model,
/// `exp(ln(observed) - 3 * SIGMA_LN)`, truncated to an integer. This is a
/// pessimistic (fast) lower bound, not an expectation. Non-positive
/// durations clamp to zero.
///
/// # Example
/// ```
/// use stopcast::feasibility::minimal_duration;
///
/// assert_eq!(minimal_duration(1200.0), 350);
/// ```
pub fn minimal_duration(observed_seconds: f64) -> i64 {
    if observed_seconds <= 0.0 {
        return 0;
    }
    (observed_seconds.ln() - 3.0 * SIGMA_LN).exp() as i64
}

/// Probability that a lognormally-distributed completion time exceeds the
/// tracking window, i.e. that the vehicle had no time to stop at all.
///
/// Shorter windows make "no time to stop" more likely; the result is
/// monotonically non-increasing in `tracking_window_seconds`. A non-positive
/// observed duration carries no no-stop mass.
pub fn no_stop_probability(observed_seconds: f64, tracking_window_seconds: f64) -> f64 {
    if observed_seconds <= 0.0 {
        return 0.0;
    }
    match LogNormal::new(observed_seconds.ln(), SIGMA_LN) {
        Ok(dist) => dist.sf(tracking_window_seconds),
        // Unreachable with a positive duration and the fixed sigma.
        Err(_) => 0.0,
    }
}

/// Decide whether a trip fits inside the tracking window and how much free
/// time it leaves for a stop.
///
/// Multi-leg trips sum per-leg minimal durations; legs are independent
/// draws with no covariance term. `free_time_seconds` is zero when the trip
/// does not fit.
pub fn feasibility(trip: &TripDuration, tracking_window_seconds: f64) -> FeasibilityResult {
    let min_duration_seconds: i64 = trip.legs.iter().map(|&leg| minimal_duration(leg)).sum();
    let fits = (min_duration_seconds as f64) < tracking_window_seconds;
    let free_time_seconds = if fits {
        tracking_window_seconds - min_duration_seconds as f64
    } else {
        0.0
    };
    FeasibilityResult {
        min_duration_seconds,
        free_time_seconds,
        fits,
    }
}

/// Filter a set of trips down to those that fit the tracking window.
///
/// Returns the original index of each fitting trip together with its
/// feasibility result, preserving input order.
pub fn filter_in_window(
    trips: &[TripDuration],
    tracking_window_seconds: f64,
) -> Vec<(usize, FeasibilityResult)> {
    let in_window: Vec<(usize, FeasibilityResult)> = trips
        .iter()
        .enumerate()
        .map(|(index, trip)| (index, feasibility(trip, tracking_window_seconds)))
        .filter(|(_, result)| result.fits)
        .collect();

    if in_window.is_empty() {
        info!(
            "no trips fit the {tracking_window_seconds}s tracking window (out of {})",
            trips.len()
        );
    } else {
        info!("{} of {} trips fit the tracking window", in_window.len(), trips.len());
    }
    in_window
}
