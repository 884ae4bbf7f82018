//! # Stopcast
//!
//! Stop-probability and uncertainty estimation for constrained vehicle
//! trips.
//!
//! Given a vehicle that must complete its trip inside a fixed tracking
//! window, stopcast estimates the probability that it stopped at one of
//! several candidate destinations versus not stopping at all, and
//! quantifies the residual uncertainty as Shannon entropy.
//!
//! The crate provides:
//! - A reversible variable-length polyline codec for coordinate paths
//! - Trip segmentation of occupancy-flagged GPS traces (occupancy,
//!   fixed-size, and time-interval-with-hysteresis policies)
//! - A lognormal feasibility filter (minimal plausible travel time,
//!   no-stop probability)
//! - A visit-probability/entropy estimator over candidate destinations
//!
//! All components are pure, synchronous transformations over caller-owned
//! data; route, place, and popularity retrieval belong to external
//! collaborators that feed these functions through the types below.
//!
//! ## Features
//!
//! - **`parallel`** - batch helpers backed by rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use stopcast::{
//!     estimate_visits, feasibility, no_stop_probability, Candidate, NoStopMode, TripDuration,
//! };
//!
//! // A 20-minute observed trip inside a 10-minute tracking window.
//! let trip = TripDuration::single(1200.0);
//! let window = 600.0;
//!
//! let result = feasibility(&trip, window);
//! assert!(result.fits);
//! assert_eq!(result.free_time_seconds, 250.0);
//!
//! let candidates = vec![
//!     Candidate::new("cafe", 180.0, 420.0, 120.0),
//!     Candidate::new("mall", 900.0, 2700.0, 40.0),
//! ];
//! let no_stop = no_stop_probability(trip.total_seconds(), window);
//! let distribution =
//!     estimate_visits(&candidates, result.free_time_seconds, no_stop, NoStopMode::IncludeInPool)
//!         .unwrap();
//!
//! let total: f64 = distribution.per_candidate_probability.iter().sum::<f64>()
//!     + distribution.no_stop_probability;
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, StopcastError};

// Polyline codec (delta + zig-zag + 5-bit chunk encoding)
pub mod polyline;

// Trip segmentation over occupancy traces
pub mod segmentation;
#[cfg(feature = "parallel")]
pub use segmentation::segment_traces_parallel;
pub use segmentation::{
    filter_trackable, segment_trace, segment_traces, OccupancyKind, SegmentationPolicy,
};

// Lognormal temporal feasibility filter
pub mod feasibility;
pub use feasibility::{
    feasibility, filter_in_window, minimal_duration, no_stop_probability, SIGMA_LN,
};

// Visit probability and entropy estimation
pub mod estimator;
#[cfg(feature = "parallel")]
pub use estimator::estimate_destinations_parallel;
pub use estimator::{
    estimate_destinations, estimate_visits, no_stop_only_distribution, shannon_entropy_bits,
    NoStopMode,
};

// ============================================================================
// Core Types
// ============================================================================

/// One sample of a mobility log: a position, the occupancy flag, and a Unix
/// timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    pub lat: f64,
    pub lon: f64,
    /// Whether the vehicle was occupied at this sample.
    pub busy: bool,
    /// Seconds since epoch. Segmentation sorts on this field.
    pub timestamp: i64,
}

impl TraceSample {
    pub fn new(lat: f64, lon: f64, busy: bool, timestamp: i64) -> Self {
        Self {
            lat,
            lon,
            busy,
            timestamp,
        }
    }
}

/// A contiguous run of trace samples judged to belong to one trip, together
/// with the polyline encoding of its path.
///
/// Segments always carry at least one sample. A single-sample segment is
/// structurally valid but its path encoding carries no direction
/// information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub samples: Vec<TraceSample>,
    /// Polyline encoding of the samples' coordinates at the codec's default
    /// precision, computed once when the segment is finalized.
    pub encoded_path: String,
}

impl Segment {
    /// The (latitude, longitude) pairs of this segment's samples.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.lat, s.lon)).collect()
    }

    /// Timestamp of the first sample.
    pub fn start_timestamp(&self) -> i64 {
        self.samples.first().map(|s| s.timestamp).unwrap_or(0)
    }

    /// Timestamp of the last sample.
    pub fn end_timestamp(&self) -> i64 {
        self.samples.last().map(|s| s.timestamp).unwrap_or(0)
    }

    /// Wall-clock span covered by the segment, in seconds.
    pub fn span_seconds(&self) -> i64 {
        self.end_timestamp() - self.start_timestamp()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Travel duration of a trip, possibly broken into independent legs when
/// the route passes through intermediate waypoints.
///
/// Legs sum with no correlation or discount term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDuration {
    /// Per-leg durations in seconds. A direct trip has a single leg.
    pub legs: Vec<f64>,
}

impl TripDuration {
    /// A direct trip with one observed duration.
    pub fn single(seconds: f64) -> Self {
        Self {
            legs: vec![seconds],
        }
    }

    /// A trip through waypoints with one duration per leg.
    pub fn with_legs(legs: Vec<f64>) -> Self {
        Self { legs }
    }

    /// Total observed duration across all legs, in seconds.
    pub fn total_seconds(&self) -> f64 {
        self.legs.iter().sum()
    }
}

/// A candidate destination along a path: a place with a reported dwell-time
/// interval and a popularity weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque place identifier; taken as given, never validated.
    pub place_id: String,
    /// Lower bound of the reported dwell time, in seconds.
    pub dwell_min_seconds: f64,
    /// Upper bound of the reported dwell time, in seconds.
    pub dwell_max_seconds: f64,
    /// Non-negative evidence count (e.g. number of ratings). Zero excludes
    /// the candidate from the distribution.
    pub popularity_weight: f64,
}

impl Candidate {
    pub fn new(
        place_id: impl Into<String>,
        dwell_min_seconds: f64,
        dwell_max_seconds: f64,
        popularity_weight: f64,
    ) -> Self {
        Self {
            place_id: place_id.into(),
            dwell_min_seconds,
            dwell_max_seconds,
            popularity_weight,
        }
    }
}

/// Outcome of checking one trip against a tracking window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityResult {
    /// Fastest plausible traversal time, in whole seconds.
    pub min_duration_seconds: i64,
    /// Time left inside the window for a stop; zero when the trip does not
    /// fit.
    pub free_time_seconds: f64,
    /// Whether the minimal duration fits inside the tracking window.
    pub fits: bool,
}

/// The terminal artifact of the pipeline: a normalized visit-probability
/// distribution over candidate destinations, the no-stop probability, and
/// the entropy of the candidate mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDistribution {
    /// Per-candidate visit probability, in input-candidate order. Excluded
    /// candidates hold 0.0.
    pub per_candidate_probability: Vec<f64>,
    /// Probability that the vehicle did not stop at all. Normalized into
    /// the pool or reported raw, depending on [`NoStopMode`].
    pub no_stop_probability: f64,
    /// Shannon entropy in bits of the candidate probability mass; the
    /// headline uncertainty metric.
    pub entropy_bits: f64,
}
