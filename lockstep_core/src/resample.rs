//! The "WARP" step - endpoint-anchored piecewise-linear resampling.
//!
//! Streams recorded at different rates end up with different sample counts.
//! To play them in lockstep every stream is stretched (or squeezed) onto a
//! shared number of samples. The final sample is always copied verbatim so the
//! last recorded pose survives the warp bit-for-bit.
//!
//! For a source of `m` samples and a target of `n` samples:
//!
//! ```text
//! stride = (m - 1) / (n - 1)
//! out[i] = lerp(src[floor(i * stride)], src[floor(i * stride) + 1], frac(i * stride))   i < n - 1
//! out[n - 1] = src[m - 1]
//! ```
//!
//! `i * stride` is split into base index and fraction with integer division
//! of `i * (m - 1)` by `n - 1`, so output positions that land on a source
//! sample copy it exactly. Interpolation is per axis; samples are positions,
//! so no rotational interpolation is needed.

use crate::error::{ReplayError, Result};
use crate::series::{ChannelId, Sample, TrajectorySeries};
use std::collections::BTreeMap;
use tracing::debug;

/// Resamples `source` to exactly `new_len` samples.
///
/// # Errors
/// `InvalidLength` if either the source or the target length is zero.
pub fn resample(source: &TrajectorySeries, new_len: usize) -> Result<TrajectorySeries> {
    let source_len = source.len();
    if source_len < 1 || new_len < 1 {
        return Err(ReplayError::invalid_length(source.key(), source_len, new_len));
    }

    if source_len == new_len {
        return Ok(source.clone());
    }

    let channels: BTreeMap<ChannelId, Vec<Sample>> = source
        .channels()
        .map(|(id, samples)| (id.clone(), resample_channel(samples, new_len)))
        .collect();

    debug!(
        key = source.key(),
        from = source_len,
        to = new_len,
        "resampled series"
    );

    Ok(source.derive(channels, new_len))
}

/// Resamples one non-empty channel to `new_len >= 1` samples.
fn resample_channel(samples: &[Sample], new_len: usize) -> Vec<Sample> {
    let last = samples.len() - 1;
    let mut out = Vec::with_capacity(new_len);

    // With a single output sample there is no stride; only the anchor remains.
    if new_len > 1 {
        let denom = new_len - 1;
        for i in 0..denom {
            let numer = i * last;
            let base = (numer / denom).min(last);
            let frac = (numer % denom) as f64 / denom as f64;
            // base + 1 can only run past the end for one-sample sources, where frac is 0
            let next = (base + 1).min(last);
            out.push(samples[base].lerp(&samples[next], frac));
        }
    }

    out.push(samples[last]);
    out
}
