//! PlaybackDriver - runs a replay session against an environment clock.
//!
//! The driver owns the loop the viewer would otherwise own: sleep one fixed
//! step on the context, apply scripted input due on that step, feed the step
//! into the session, and capture a frame for every committed tick.

use crate::exporter::{ReplayExport, ReplayFrame, StreamFrame};
use crate::scripts::InputScript;
use lockstep_core::{PlaybackEvent, ReplaySession, TransportState};
use lockstep_env::ReplayContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Fixed update step of the driver loop (50 Hz).
pub const DEFAULT_STEP: Duration = Duration::from_millis(20);

/// Outcome of a driver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Driver steps executed
    pub steps: u64,

    /// Ticks committed by the playback
    pub ticks: u64,

    /// End-of-data events observed
    pub ends: u64,

    /// Restarts performed
    pub restarts: u64,

    pub final_state: TransportState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_global_index: Option<usize>,

    /// Final per-stream indices in input order
    pub final_indices: Vec<usize>,

    /// Context time at the end of the run
    pub elapsed_secs: f64,
}

/// Drives a [`ReplaySession`] through a [`ReplayContext`].
pub struct PlaybackDriver<Ctx: ReplayContext> {
    context: Arc<Ctx>,
    session: ReplaySession,
    script: InputScript,
    step: Duration,
    export: Option<ReplayExport>,
    steps: u64,
    ends: u64,
}

impl<Ctx: ReplayContext> PlaybackDriver<Ctx> {
    pub fn new(context: Arc<Ctx>, session: ReplaySession) -> Self {
        Self {
            context,
            session,
            script: InputScript::new(),
            step: DEFAULT_STEP,
            export: None,
            steps: 0,
            ends: 0,
        }
    }

    /// Sets the fixed loop step.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Sets the input script.
    pub fn with_script(mut self, script: InputScript) -> Self {
        self.script = script;
        self
    }

    /// Captures a frame for every committed tick.
    pub fn with_export(mut self) -> Self {
        let set = self.session.playback().set();
        self.export = Some(ReplayExport::new(
            set.streams().iter().map(|s| s.key().to_string()).collect(),
            set.policy(),
            set.common_length(),
        ));
        self
    }

    pub fn session(&self) -> &ReplaySession {
        &self.session
    }

    /// Runs `steps` loop iterations.
    pub async fn run(&mut self, steps: u64) -> RunSummary {
        info!(
            steps,
            step_ms = self.step.as_millis() as u64,
            virtual_clock = self.context.is_virtual(),
            "replay started"
        );

        for _ in 0..steps {
            self.step_once().await;
        }

        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            ends = summary.ends,
            restarts = summary.restarts,
            state = %summary.final_state,
            "replay finished"
        );
        summary
    }

    /// One loop iteration: wait, apply input, update, capture.
    pub async fn step_once(&mut self) -> Vec<PlaybackEvent> {
        self.context.sleep(self.step).await;
        self.steps += 1;

        for command in self.script.commands_at(self.steps) {
            self.session.apply(*command);
        }

        let events = self.session.update(self.step);
        for event in &events {
            match event {
                PlaybackEvent::Tick { tick, .. } => {
                    if self.export.is_some() {
                        let frame = self.capture(*tick);
                        if let Some(export) = self.export.as_mut() {
                            export.add_frame(frame);
                        }
                    }
                }
                PlaybackEvent::Ended { tick } => {
                    self.ends += 1;
                    debug!(tick, "end of data");
                }
                PlaybackEvent::Restarted { restarts } => {
                    debug!(restarts, "scene reset");
                }
            }
        }
        events
    }

    fn capture(&self, tick: u64) -> ReplayFrame {
        let playback = self.session.playback();
        let streams = playback
            .streams()
            .enumerate()
            .map(|(i, (series, cursor))| {
                let trace = self.session.trace(i).map(|t| t.points).unwrap_or_default();
                StreamFrame::capture(series, cursor, trace)
            })
            .collect();

        ReplayFrame {
            step: self.steps,
            tick,
            time_sec: self.context.now().as_secs_f64(),
            state: self.session.state(),
            global_index: playback.global_index(),
            streams,
        }
    }

    pub fn summary(&self) -> RunSummary {
        let playback = self.session.playback();
        RunSummary {
            steps: self.steps,
            ticks: playback.tick_count(),
            ends: self.ends,
            restarts: playback.restart_count(),
            final_state: self.session.state(),
            final_global_index: playback.global_index(),
            final_indices: playback.cursors().iter().map(|c| c.index()).collect(),
            elapsed_secs: self.context.now().as_secs_f64(),
        }
    }

    /// Finalizes and returns the captured export, if enabled.
    pub fn take_export(&mut self) -> Option<ReplayExport> {
        let summary = self.summary();
        self.export.take().map(|mut export| {
            export.finalize(summary);
            export
        })
    }
}
