//! Trajectory series - one recorded stream of named marker channels.
//!
//! A series stores one `Vec<Sample>` per channel. All channels share the same
//! length, so index `i` refers to the same instant in every channel. Series are
//! built once at load time and never mutated afterwards; resampling produces a
//! new series rather than editing one in place.

use crate::error::{ReplayError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One 3D marker position in millimeters.
pub type Sample = Vector3<f64>;

/// Identifier of a tracked marker channel (e.g. `instrument-tip`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub const INSTRUMENT_TIP: &'static str = "instrument-tip";
    pub const INSTRUMENT_CORNER_A: &'static str = "instrument-corner-a";
    pub const INSTRUMENT_CORNER_B: &'static str = "instrument-corner-b";
    pub const INSTRUMENT_CORNER_C: &'static str = "instrument-corner-c";
    pub const INSTRUMENT_CORNER_D: &'static str = "instrument-corner-d";
    pub const HEAD_CORNER_A: &'static str = "head-corner-a";
    pub const HEAD_CORNER_B: &'static str = "head-corner-b";
    pub const HEAD_CORNER_C: &'static str = "head-corner-c";
    pub const HEAD_CORNER_D: &'static str = "head-corner-d";
    pub const HEAD_BROW: &'static str = "head-brow";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The channels attached to the instrument marker tree.
    pub fn instrument_group() -> Vec<ChannelId> {
        [
            Self::INSTRUMENT_TIP,
            Self::INSTRUMENT_CORNER_A,
            Self::INSTRUMENT_CORNER_B,
            Self::INSTRUMENT_CORNER_C,
            Self::INSTRUMENT_CORNER_D,
        ]
        .into_iter()
        .map(ChannelId::from)
        .collect()
    }

    /// The channels attached to the head reference frame.
    pub fn head_group() -> Vec<ChannelId> {
        [
            Self::HEAD_CORNER_A,
            Self::HEAD_CORNER_B,
            Self::HEAD_CORNER_C,
            Self::HEAD_CORNER_D,
            Self::HEAD_BROW,
        ]
        .into_iter()
        .map(ChannelId::from)
        .collect()
    }
}

impl From<&str> for ChannelId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable recorded stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySeries {
    /// Stable identifying key (source path or name)
    key: String,

    /// Per-channel samples, sorted by channel id
    channels: BTreeMap<ChannelId, Vec<Sample>>,

    /// Shared sample count of every channel
    len: usize,

    /// Sample count of the recording as loaded, before any resampling
    original_len: usize,
}

impl TrajectorySeries {
    /// Builds a series, rejecting channels of unequal length and channels
    /// supplied more than once.
    ///
    /// The first channel sets the expected length. A series without channels
    /// has length zero.
    pub fn new<I>(key: impl Into<String>, channels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ChannelId, Vec<Sample>)>,
    {
        let key = key.into();
        let mut map: BTreeMap<ChannelId, Vec<Sample>> = BTreeMap::new();
        let mut expected: Option<usize> = None;

        for (channel, samples) in channels {
            let len = *expected.get_or_insert(samples.len());
            if samples.len() != len {
                return Err(ReplayError::ChannelLengthMismatch {
                    key,
                    channel: channel.to_string(),
                    expected: len,
                    found: samples.len(),
                });
            }
            if map.contains_key(&channel) {
                return Err(ReplayError::DuplicateChannel {
                    key,
                    channel: channel.to_string(),
                });
            }
            map.insert(channel, samples);
        }

        let len = expected.unwrap_or(0);

        Ok(Self {
            key,
            channels: map,
            len,
            original_len: len,
        })
    }

    /// Rebuilds a series with new channel data but the same identity.
    ///
    /// Used by the resampler; `original_len` is carried over from `self`.
    pub(crate) fn derive(&self, channels: BTreeMap<ChannelId, Vec<Sample>>, len: usize) -> Self {
        Self {
            key: self.key.clone(),
            channels,
            len,
            original_len: self.original_len,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current sample count.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sample count as originally recorded.
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    /// True if this series has been resampled to a different length.
    pub fn is_resampled(&self) -> bool {
        self.len != self.original_len
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel ids in deterministic (sorted) order.
    pub fn channel_ids(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    /// All samples of one channel.
    pub fn channel(&self, id: &ChannelId) -> Option<&[Sample]> {
        self.channels.get(id).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = (&ChannelId, &[Sample])> {
        self.channels.iter().map(|(id, s)| (id, s.as_slice()))
    }

    /// One sample of one channel.
    pub fn sample(&self, id: &ChannelId, index: usize) -> Option<&Sample> {
        self.channels.get(id).and_then(|s| s.get(index))
    }

    /// All channel samples at one index.
    pub fn frame(&self, index: usize) -> Option<BTreeMap<&ChannelId, Sample>> {
        if index >= self.len {
            return None;
        }
        Some(
            self.channels
                .iter()
                .map(|(id, samples)| (id, samples[index]))
                .collect(),
        )
    }

    /// Mean position of a group of channels at one index.
    ///
    /// Channels missing from this series are skipped; returns `None` when
    /// none of them are present or the index is out of range.
    pub fn centroid(&self, group: &[ChannelId], index: usize) -> Option<Sample> {
        let points: Vec<&Sample> = group
            .iter()
            .filter_map(|id| self.sample(id, index))
            .collect();
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Sample::zeros(), |acc, p| acc + *p);
        Some(sum / points.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(n: usize, dx: f64) -> Vec<Sample> {
        (0..n).map(|i| Sample::new(i as f64 * dx, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_series_construction() {
        let series = TrajectorySeries::new(
            "rec-1",
            vec![
                (ChannelId::from(ChannelId::INSTRUMENT_TIP), line(4, 1.0)),
                (ChannelId::from(ChannelId::HEAD_BROW), line(4, 0.0)),
            ],
        )
        .unwrap();

        assert_eq!(series.key(), "rec-1");
        assert_eq!(series.len(), 4);
        assert_eq!(series.original_len(), 4);
        assert_eq!(series.channel_count(), 2);
        assert!(!series.is_resampled());
    }

    #[test]
    fn test_channel_length_mismatch_rejected() {
        let err = TrajectorySeries::new(
            "bad",
            vec![
                (ChannelId::from("a"), line(4, 1.0)),
                (ChannelId::from("b"), line(3, 1.0)),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            ReplayError::ChannelLengthMismatch {
                key: "bad".to_string(),
                channel: "b".to_string(),
                expected: 4,
                found: 3,
            }
        );
    }

    #[test]
    fn test_repeated_channel_rejected() {
        let err = TrajectorySeries::new(
            "dup",
            vec![
                (ChannelId::from(ChannelId::INSTRUMENT_TIP), line(3, 1.0)),
                (ChannelId::from(ChannelId::INSTRUMENT_TIP), line(5, 1.0)),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReplayError::ChannelLengthMismatch {
                key: "dup".to_string(),
                channel: "instrument-tip".to_string(),
                expected: 3,
                found: 5,
            }
        );

        let err = TrajectorySeries::new(
            "dup",
            vec![
                (ChannelId::from("a"), line(3, 1.0)),
                (ChannelId::from("a"), line(3, 2.0)),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReplayError::DuplicateChannel {
                key: "dup".to_string(),
                channel: "a".to_string(),
            }
        );
    }

    #[test]
    fn test_channel_order_is_sorted() {
        let series = TrajectorySeries::new(
            "rec",
            vec![
                (ChannelId::from("zeta"), line(2, 1.0)),
                (ChannelId::from("alpha"), line(2, 1.0)),
            ],
        )
        .unwrap();

        let ids: Vec<&str> = series.channel_ids().map(ChannelId::as_str).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_frame_out_of_range() {
        let series =
            TrajectorySeries::new("rec", vec![(ChannelId::from("a"), line(3, 1.0))]).unwrap();
        assert!(series.frame(2).is_some());
        assert!(series.frame(3).is_none());
    }

    #[test]
    fn test_centroid_skips_missing_channels() {
        let series = TrajectorySeries::new(
            "rec",
            vec![
                (ChannelId::from("a"), vec![Sample::new(0.0, 0.0, 0.0)]),
                (ChannelId::from("b"), vec![Sample::new(2.0, 4.0, 6.0)]),
            ],
        )
        .unwrap();

        let group = vec![ChannelId::from("a"), ChannelId::from("b"), ChannelId::from("c")];
        let c = series.centroid(&group, 0).unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 2.0);
        assert_relative_eq!(c.z, 3.0);

        assert!(series.centroid(&[ChannelId::from("c")], 0).is_none());
    }
}
