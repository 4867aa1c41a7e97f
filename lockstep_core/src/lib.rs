//! Lockstep Core - Synchronized Multi-Stream Trajectory Replay
//!
//! Replays several independently recorded marker streams as one timeline:
//! 1. **Warp**: endpoint-anchored linear resampling onto a common length
//! 2. **Transport**: direction / speed / pause, end-of-data and delayed restart
//! 3. **Path trace**: bounded window of the instrument's path around the playhead

pub mod config;
pub mod error;
pub mod path_trace;
pub mod playback;
pub mod resample;
pub mod series;
pub mod sync;
pub mod transport;

// Re-export key types for convenience
pub use config::ReplayConfig;
pub use error::ReplayError;
pub use path_trace::{window, PathTrace};
pub use playback::{Playback, PlaybackEvent, ReplaySession, StreamCursor, TickOutcome};
pub use resample::resample;
pub use series::{ChannelId, Sample, TrajectorySeries};
pub use sync::{SyncPolicy, SynchronizationSet};
pub use transport::{Direction, TickGate, Transport, TransportCommand, TransportState};
