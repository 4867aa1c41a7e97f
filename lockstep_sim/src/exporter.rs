//! JSON exporter for replay frames.
//!
//! Captures what a renderer would read after each committed tick: every
//! marker position, the marker-group centroids used to place the instrument
//! and head models, and the path trace. Positions are converted from
//! millimeters to scene units (meters).

use crate::driver::RunSummary;
use lockstep_core::{ChannelId, Sample, StreamCursor, SyncPolicy, TransportState, TrajectorySeries};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Millimeters per scene unit.
pub const MM_PER_SCENE_UNIT: f64 = 1000.0;

/// Converts a recorded sample to scene units.
pub fn to_scene_units(sample: &Sample) -> [f64; 3] {
    [
        sample.x / MM_PER_SCENE_UNIT,
        sample.y / MM_PER_SCENE_UNIT,
        sample.z / MM_PER_SCENE_UNIT,
    ]
}

/// A single committed tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Driver step the tick was committed on
    pub step: u64,

    /// Committed tick number
    pub tick: u64,

    /// Virtual or wall time in seconds
    pub time_sec: f64,

    pub state: TransportState,

    /// Shared index under warping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_index: Option<usize>,

    pub streams: Vec<StreamFrame>,
}

/// One stream at one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    pub key: String,
    pub index: usize,
    pub exhausted: bool,
    pub markers: Vec<MarkerPosition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_center: Option<[f64; 3]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_center: Option<[f64; 3]>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<[f64; 3]>,
}

impl StreamFrame {
    /// Snapshot of `series` at `cursor`, with `trace` already extracted.
    pub fn capture(series: &TrajectorySeries, cursor: &StreamCursor, trace: &[Sample]) -> Self {
        let index = cursor.display_index();
        let markers = index
            .and_then(|i| series.frame(i))
            .map(|frame| {
                frame
                    .into_iter()
                    .map(|(channel, sample)| MarkerPosition::new(channel, &sample))
                    .collect()
            })
            .unwrap_or_default();
        let center = |group: Vec<ChannelId>| {
            index
                .and_then(|i| series.centroid(&group, i))
                .map(|c| to_scene_units(&c))
        };

        Self {
            key: series.key().to_string(),
            index: cursor.index(),
            exhausted: cursor.is_exhausted(),
            markers,
            instrument_center: center(ChannelId::instrument_group()),
            head_center: center(ChannelId::head_group()),
            trace: trace.iter().map(to_scene_units).collect(),
        }
    }
}

/// Position of one marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerPosition {
    pub channel: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MarkerPosition {
    pub fn new(channel: &ChannelId, sample: &Sample) -> Self {
        let [x, y, z] = to_scene_units(sample);
        Self {
            channel: channel.to_string(),
            x,
            y,
            z,
        }
    }
}

/// Complete replay export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayExport {
    /// Stream keys in playback order
    pub sources: Vec<String>,

    pub policy: SyncPolicy,

    pub common_length: usize,

    /// All captured frames
    pub frames: Vec<ReplayFrame>,

    /// Final results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl ReplayExport {
    /// Creates a new export container.
    pub fn new(sources: Vec<String>, policy: SyncPolicy, common_length: usize) -> Self {
        Self {
            sources,
            policy,
            common_length,
            frames: Vec::new(),
            summary: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: ReplayFrame) {
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, summary: RunSummary) {
        self.summary = Some(summary);
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
