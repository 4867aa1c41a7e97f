//! Lockstep Replay Harness
//!
//! Runs the replay core end to end: recordings come from tab-separated files
//! or a seeded generator, input comes from a named script, and time comes
//! from a [`ReplayContext`](lockstep_env::ReplayContext).
//!
//! # Core Principle: The Reactor Pattern
//!
//! The session never reads a clock. [`PlaybackDriver`] sleeps one fixed step
//! on its context and feeds that step into the session, so the same run is
//! reproduced exactly on the virtual clock of [`SimContext`] and paced in real
//! time on [`TokioContext`](lockstep_env::TokioContext).
//!
//! ```text
//!   files / SyntheticRecorder ──► SynchronizationSet ──► ReplaySession
//!                                                            ▲    │
//!                        InputScript ── commands ────────────┘    │ events
//!                        ReplayContext ── sleep(step) ──► driver ◄┘
//!                                                            │
//!                                                  ReplayExport (JSON)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use lockstep_sim::{PlaybackDriver, SimContext, SyntheticRecorder};
//!
//! let streams = SyntheticRecorder::new(42).record_session(&[100, 137])?;
//! let set = SynchronizationSet::build(streams, true)?;
//! let session = ReplaySession::new(set, &ReplayConfig::default());
//! let mut driver = PlaybackDriver::new(SimContext::shared(), session);
//! let summary = driver.run(5000).await;
//! ```

mod context;
pub mod driver;
pub mod exporter;
pub mod loader;
pub mod scripts;
pub mod synthetic;

pub use context::SimContext;
pub use driver::{PlaybackDriver, RunSummary, DEFAULT_STEP};
pub use exporter::{MarkerPosition, ReplayExport, ReplayFrame, StreamFrame};
pub use loader::{load_config, load_recording, parse_recording, ChannelColumns, ChannelLayout, LoadError};
pub use scripts::{InputScript, ScriptId};
pub use synthetic::SyntheticRecorder;
