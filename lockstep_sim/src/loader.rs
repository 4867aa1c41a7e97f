//! Recording loader - tab-separated marker files into trajectory series.
//!
//! File layout, as written by the motion-capture recorder:
//!
//! ```text
//! Frame  Time  M1_X  M1_Z  M1_Y  M2_X  M2_Z  M2_Y  ...      <- one header line
//! 0      0.00  12.1  40.2  -3.7  ...
//! 1      0.01  12.2  40.1  -3.7  ...
//!                                                          <- first empty line ends the data
//! ```
//!
//! Rows are stored in file order: index 0 is the first data row. The frame
//! column is informational; gaps or a 1-based numbering are logged, never used
//! as indices.

use lockstep_core::{ChannelId, ReplayConfig, ReplayError, Sample, TrajectorySeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Column separator of recorder files.
pub const SEPARATOR: char = '\t';

/// Errors raised while reading recordings or configuration files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: missing column {column}")]
    MissingColumn { line: usize, column: usize },

    #[error("Line {line}, column {column}: cannot parse '{value}' as a number")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Layout {path} lists channel '{channel}' more than once")]
    DuplicateChannel { path: PathBuf, channel: ChannelId },

    #[error(transparent)]
    Series(#[from] ReplayError),
}

/// Column indices of one marker's coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelColumns {
    pub channel: ChannelId,
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl ChannelColumns {
    /// Recorder order: x, then z, then y.
    fn recorder(channel: &str, first: usize) -> Self {
        Self {
            channel: ChannelId::from(channel),
            x: first,
            y: first + 2,
            z: first + 1,
        }
    }

    fn max_column(&self) -> usize {
        self.x.max(self.y).max(self.z)
    }
}

/// Which columns hold which channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLayout {
    /// Column of the frame number (default: 0)
    #[serde(default)]
    pub frame_column: Option<usize>,

    pub channels: Vec<ChannelColumns>,
}

impl Default for ChannelLayout {
    /// Layout of the recorder's ten-marker files: four head corners and the
    /// brow marker, then the instrument tip and its four corners.
    fn default() -> Self {
        let order = [
            ChannelId::HEAD_CORNER_A,
            ChannelId::HEAD_CORNER_B,
            ChannelId::HEAD_CORNER_C,
            ChannelId::HEAD_CORNER_D,
            ChannelId::HEAD_BROW,
            ChannelId::INSTRUMENT_TIP,
            ChannelId::INSTRUMENT_CORNER_A,
            ChannelId::INSTRUMENT_CORNER_B,
            ChannelId::INSTRUMENT_CORNER_C,
            ChannelId::INSTRUMENT_CORNER_D,
        ];
        Self {
            frame_column: Some(0),
            channels: order
                .iter()
                .enumerate()
                .map(|(i, name)| ChannelColumns::recorder(name, 2 + 3 * i))
                .collect(),
        }
    }
}

impl ChannelLayout {
    /// Loads a layout from a JSON file. Each channel may appear only once.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout: Self = serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(channel) = layout.first_duplicate() {
            return Err(LoadError::DuplicateChannel {
                path: path.to_path_buf(),
                channel: channel.clone(),
            });
        }
        Ok(layout)
    }

    fn first_duplicate(&self) -> Option<&ChannelId> {
        let mut seen = BTreeSet::new();
        self.channels
            .iter()
            .map(|c| &c.channel)
            .find(|channel| !seen.insert(*channel))
    }

    fn min_columns(&self) -> usize {
        self.channels
            .iter()
            .map(ChannelColumns::max_column)
            .chain(self.frame_column)
            .max()
            .map_or(0, |c| c + 1)
    }
}

/// Loads a replay configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<ReplayConfig, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ReplayConfig::from_json(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads one recording; the series key is the path as given.
pub fn load_recording(path: impl AsRef<Path>, layout: &ChannelLayout) -> Result<TrajectorySeries, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_recording(path.display().to_string(), BufReader::new(file), layout).map_err(|e| match e {
        LoadError::Io { source, .. } => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parses recorder text from any reader.
pub fn parse_recording<R: BufRead>(
    key: impl Into<String>,
    reader: R,
    layout: &ChannelLayout,
) -> Result<TrajectorySeries, LoadError> {
    let key = key.into();
    let min_columns = layout.min_columns();
    let mut channels: Vec<Vec<Sample>> = vec![Vec::new(); layout.channels.len()];
    let mut numbering_reported = false;

    // Line numbers are 1-based and count the header
    for (line_idx, line) in reader.lines().enumerate().skip(1) {
        let line_no = line_idx + 1;
        let line = line.map_err(|source| LoadError::Io {
            path: PathBuf::from(&key),
            source,
        })?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }

        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        if fields.len() < min_columns {
            return Err(LoadError::MissingColumn {
                line: line_no,
                column: fields.len(),
            });
        }

        let row = line_idx - 1;
        if let Some(column) = layout.frame_column {
            let frame = fields[column].trim();
            if !numbering_reported && frame.parse::<usize>().ok() != Some(row) {
                warn!(key = %key, line = line_no, frame, row, "frame column does not match row order; using row order");
                numbering_reported = true;
            }
        }

        for (samples, columns) in channels.iter_mut().zip(&layout.channels) {
            let x = parse_field(&fields, columns.x, line_no)?;
            let y = parse_field(&fields, columns.y, line_no)?;
            let z = parse_field(&fields, columns.z, line_no)?;
            samples.push(Sample::new(x, y, z));
        }
    }

    let series = TrajectorySeries::new(
        key,
        layout
            .channels
            .iter()
            .map(|c| c.channel.clone())
            .zip(channels),
    )?;
    debug!(key = series.key(), samples = series.len(), "recording loaded");
    Ok(series)
}

fn parse_field(fields: &[&str], column: usize, line: usize) -> Result<f64, LoadError> {
    let raw = fields
        .get(column)
        .ok_or(LoadError::MissingColumn { line, column })?
        .trim();
    raw.parse::<f64>().map_err(|_| LoadError::Parse {
        line,
        column,
        value: raw.to_string(),
    })
}
