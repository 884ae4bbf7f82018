//! Trip segmentation over time-ordered occupancy traces.
//!
//! Partitions a taxi-style mobility log (coordinate + busy flag + timestamp)
//! into coherent trip segments using one of three policies:
//! - **Occupancy**: cut at busy/idle flag transitions, keeping busy runs,
//!   idle runs, or every run.
//! - **FixedSize**: cut every `chunk_size` samples.
//! - **TimeInterval**: cut on time jumps, with a hysteresis counter that
//!   widens the accepted window one interval at a time and force-closes the
//!   segment once the counter hits its ceiling.
//!
//! Samples are stable-sorted by timestamp before segmentation; callers do
//! not need to pre-sort. Every emitted segment is finalized with its
//! encoded polyline at the default codec precision.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StopcastError};
use crate::polyline;
use crate::{Segment, TraceSample};

/// Hard ceiling on successive window extensions under the time-interval
/// policy. Bounds segment growth on traces with steadily drifting gaps.
pub const MAX_TIME_GAP: i64 = 61;

/// Which occupancy runs to keep when cutting at flag transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyKind {
    /// Keep runs where the vehicle is occupied; idle samples are dropped.
    Busy,
    /// Keep runs where the vehicle is empty; busy samples are dropped.
    Idle,
    /// Keep every run, cutting at each flag transition.
    Continuous,
}

/// Segmentation policy with its policy-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SegmentationPolicy {
    /// Cut at occupancy-flag transitions.
    Occupancy { kind: OccupancyKind },
    /// Cut every `chunk_size` samples. The size is a fixed constant for the
    /// whole trace; zero is an invalid configuration.
    FixedSize { chunk_size: usize },
    /// Cut on time jumps larger than one interval step beyond the current
    /// hysteresis window. Non-positive intervals are invalid.
    TimeInterval { interval_seconds: i64 },
}

/// Hysteresis state for the time-interval policy, threaded through the
/// segmentation loop as a plain value.
struct TimeWindow {
    start_timestamp: i64,
    time_gap: i64,
    samples: Vec<TraceSample>,
}

impl TimeWindow {
    fn open(sample: TraceSample) -> Self {
        Self {
            start_timestamp: sample.timestamp,
            time_gap: 1,
            samples: vec![sample],
        }
    }
}

/// Segment a trace under the given policy.
///
/// The samples are stable-sorted by timestamp first. An empty trace yields
/// an empty segment list, not an error. Every returned segment carries at
/// least one sample and its finalized polyline encoding.
///
/// # Example
/// ```
/// use stopcast::{segment_trace, OccupancyKind, SegmentationPolicy, TraceSample};
///
/// let trace = vec![
///     TraceSample::new(37.75, -122.39, true, 0),
///     TraceSample::new(37.76, -122.40, true, 60),
///     TraceSample::new(37.77, -122.41, false, 120),
/// ];
/// let policy = SegmentationPolicy::Occupancy { kind: OccupancyKind::Busy };
/// let segments = segment_trace(trace, &policy).unwrap();
/// assert_eq!(segments.len(), 1);
/// assert_eq!(segments[0].samples.len(), 2);
/// ```
pub fn segment_trace(
    mut samples: Vec<TraceSample>,
    policy: &SegmentationPolicy,
) -> Result<Vec<Segment>> {
    validate_policy(policy)?;
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    // Stable sort keeps co-timestamped samples in input order.
    samples.sort_by_key(|s| s.timestamp);

    let runs = match *policy {
        SegmentationPolicy::Occupancy { kind } => split_by_occupancy(samples, kind),
        SegmentationPolicy::FixedSize { chunk_size } => split_by_chunks(samples, chunk_size),
        SegmentationPolicy::TimeInterval { interval_seconds } => {
            split_by_time(samples, interval_seconds)
        }
    };

    runs.into_iter()
        .filter(|run| !run.is_empty())
        .map(finalize_segment)
        .collect()
}

/// Segment several independent traces under one policy.
pub fn segment_traces(
    traces: Vec<Vec<TraceSample>>,
    policy: &SegmentationPolicy,
) -> Result<Vec<Vec<Segment>>> {
    traces
        .into_iter()
        .map(|trace| segment_trace(trace, policy))
        .collect()
}

/// Segment several independent traces in parallel. Each trace is processed
/// by a pure call to [`segment_trace`], so no coordination is needed.
#[cfg(feature = "parallel")]
pub fn segment_traces_parallel(
    traces: Vec<Vec<TraceSample>>,
    policy: &SegmentationPolicy,
) -> Result<Vec<Vec<Segment>>> {
    traces
        .into_par_iter()
        .map(|trace| segment_trace(trace, policy))
        .collect()
}

/// Keep at most `max_segments` segments long enough to be worth tracking.
///
/// A segment qualifies when it carries more than `min_samples` samples.
/// Order is preserved. Useful for trimming a segmented dataset down to the
/// trips that actually span a tracking window.
pub fn filter_trackable(
    segments: Vec<Segment>,
    min_samples: usize,
    max_segments: usize,
) -> Vec<Segment> {
    segments
        .into_iter()
        .filter(|segment| segment.samples.len() > min_samples)
        .take(max_segments)
        .collect()
}

fn validate_policy(policy: &SegmentationPolicy) -> Result<()> {
    match *policy {
        SegmentationPolicy::FixedSize { chunk_size } if chunk_size == 0 => {
            Err(StopcastError::InvalidConfiguration {
                reason: "fixed-size chunking requires a chunk size of at least 1".to_string(),
            })
        }
        SegmentationPolicy::TimeInterval { interval_seconds } if interval_seconds <= 0 => {
            Err(StopcastError::InvalidConfiguration {
                reason: format!("time interval must be positive, got {interval_seconds}"),
            })
        }
        _ => Ok(()),
    }
}

fn finalize_segment(samples: Vec<TraceSample>) -> Result<Segment> {
    let points: Vec<(f64, f64)> = samples.iter().map(|s| (s.lat, s.lon)).collect();
    let encoded_path = polyline::encode(&points, polyline::DEFAULT_PRECISION)?;
    Ok(Segment {
        samples,
        encoded_path,
    })
}

fn split_by_occupancy(samples: Vec<TraceSample>, kind: OccupancyKind) -> Vec<Vec<TraceSample>> {
    let mut runs = Vec::new();
    let mut current: Vec<TraceSample> = Vec::new();

    for sample in samples {
        let keep = match kind {
            OccupancyKind::Busy => sample.busy,
            OccupancyKind::Idle => !sample.busy,
            OccupancyKind::Continuous => true,
        };
        if !keep {
            // Filtered-out region: close whatever run was open.
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            continue;
        }
        if kind == OccupancyKind::Continuous {
            // Cut at each flag transition.
            if let Some(last) = current.last() {
                if last.busy != sample.busy {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
        current.push(sample);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn split_by_chunks(samples: Vec<TraceSample>, chunk_size: usize) -> Vec<Vec<TraceSample>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

fn split_by_time(samples: Vec<TraceSample>, interval_seconds: i64) -> Vec<Vec<TraceSample>> {
    let mut runs = Vec::new();
    let mut window: Option<TimeWindow> = None;

    for sample in samples {
        let Some(current) = window.as_mut() else {
            window = Some(TimeWindow::open(sample));
            continue;
        };

        let elapsed = sample.timestamp - current.start_timestamp;
        if elapsed <= interval_seconds * current.time_gap {
            // Still inside the accepted window.
            current.samples.push(sample);
        } else if elapsed <= interval_seconds * (current.time_gap + 1) {
            // One step beyond: extend the window, unless the ceiling is hit.
            if current.time_gap >= MAX_TIME_GAP {
                runs.push(std::mem::take(&mut current.samples));
                *current = TimeWindow::open(sample);
            } else {
                current.samples.push(sample);
                current.time_gap += 1;
            }
        } else {
            // Jumped more than one interval step: hard boundary.
            runs.push(std::mem::take(&mut current.samples));
            *current = TimeWindow::open(sample);
        }
    }
    if let Some(current) = window {
        if !current.samples.is_empty() {
            runs.push(current.samples);
        }
    }
    runs
}
