//! Path trace window - the trail of instrument positions around the playhead.
//!
//! ```text
//!   past = min(size / 2, current)          future = min(size / 2, len - current)
//!   ├──────── past ────────┼──────── future ────────┤
//!   current - past       current              current + future
//! ```
//!
//! `future` counts the current sample itself, so the trail always contains the
//! playhead unless the series is exhausted (`current == len`).

use crate::series::{ChannelId, Sample, TrajectorySeries};

/// A contiguous slice of one channel around a playback index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathTrace<'a> {
    /// Index of `points[0]` in the series
    pub start: usize,

    /// Samples before the current index
    pub past_count: usize,

    /// Samples from the current index onward (including it)
    pub future_count: usize,

    /// Points ordered from earliest to latest
    pub points: &'a [Sample],
}

impl<'a> PathTrace<'a> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The sample at the playback index, if still inside the series.
    pub fn current(&self) -> Option<&'a Sample> {
        if self.future_count == 0 {
            None
        } else {
            self.points.get(self.past_count)
        }
    }
}

/// Window bounds `(start, past_count, future_count)` for a series of `len`
/// samples. `current` beyond `len` is treated as `len`.
pub fn window_bounds(len: usize, current: usize, desired_size: usize) -> (usize, usize, usize) {
    let current = current.min(len);
    let half = desired_size / 2;
    let past = half.min(current);
    let future = half.min(len - current);
    (current - past, past, future)
}

/// Extracts the trace of `channel` around `current`.
///
/// Returns `None` if the series has no such channel.
pub fn window<'a>(
    series: &'a TrajectorySeries,
    channel: &ChannelId,
    current: usize,
    desired_size: usize,
) -> Option<PathTrace<'a>> {
    let samples = series.channel(channel)?;
    let (start, past_count, future_count) = window_bounds(samples.len(), current, desired_size);
    Some(PathTrace {
        start,
        past_count,
        future_count,
        points: &samples[start..start + past_count + future_count],
    })
}
