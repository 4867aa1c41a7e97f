//! Synchronization set - all streams of one replay session on a shared length.

use crate::error::{ReplayError, Result};
use crate::resample::resample;
use crate::series::TrajectorySeries;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// How streams of different lengths are played together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Resample every stream onto the common length and share one index.
    Warp,

    /// Keep native lengths; each stream advances and exhausts on its own.
    Independent,
}

impl SyncPolicy {
    pub fn from_warp_flag(warp_enabled: bool) -> Self {
        if warp_enabled {
            SyncPolicy::Warp
        } else {
            SyncPolicy::Independent
        }
    }

    pub fn is_warp(&self) -> bool {
        matches!(self, SyncPolicy::Warp)
    }
}

/// The streams of a session, in input order, sharing one `common_length`.
///
/// Built once before playback starts; read-only afterwards. Series are held
/// behind `Arc` so a presentation layer can keep references while the
/// transport runs.
#[derive(Debug, Clone)]
pub struct SynchronizationSet {
    streams: Vec<Arc<TrajectorySeries>>,
    common_length: usize,
    policy: SyncPolicy,
}

impl SynchronizationSet {
    /// Builds the set and, with warping enabled, resamples every stream whose
    /// length differs from the longest one.
    ///
    /// `common_length` is the maximum input length under both policies.
    ///
    /// # Errors
    /// * `EmptyStreamSet` - no streams
    /// * `InvalidLength` - every stream is empty, or (with warping) one stream is
    pub fn build(streams: Vec<TrajectorySeries>, warp_enabled: bool) -> Result<Self> {
        let policy = SyncPolicy::from_warp_flag(warp_enabled);

        let common_length = streams
            .iter()
            .map(TrajectorySeries::len)
            .max()
            .ok_or(ReplayError::EmptyStreamSet)?;

        if common_length == 0 {
            let key = streams.first().map(|s| s.key().to_string()).unwrap_or_default();
            return Err(ReplayError::invalid_length(key, 0, 0));
        }

        let streams = match policy {
            SyncPolicy::Warp => streams
                .into_iter()
                .map(|series| {
                    if series.len() == common_length {
                        Ok(Arc::new(series))
                    } else {
                        resample(&series, common_length).map(Arc::new)
                    }
                })
                .collect::<Result<Vec<_>>>()?,
            SyncPolicy::Independent => streams.into_iter().map(Arc::new).collect(),
        };

        for series in &streams {
            debug!(
                key = series.key(),
                original = series.original_len(),
                len = series.len(),
                "stream ready"
            );
        }
        info!(
            streams = streams.len(),
            common_length,
            ?policy,
            "synchronization set built"
        );

        Ok(Self {
            streams,
            common_length,
            policy,
        })
    }

    /// Shared upper bound of the playback index.
    pub fn common_length(&self) -> usize {
        self.common_length
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn streams(&self) -> &[Arc<TrajectorySeries>] {
        &self.streams
    }

    pub fn get(&self, position: usize) -> Option<&Arc<TrajectorySeries>> {
        self.streams.get(position)
    }

    /// First stream with the given key.
    pub fn find(&self, key: &str) -> Option<&Arc<TrajectorySeries>> {
        self.streams.iter().find(|s| s.key() == key)
    }
}
