//! Playback - per-stream cursors driven by the transport.
//!
//! [`Playback`] commits exactly one step per [`Playback::tick`] call and owns
//! end-of-data detection and the delayed restart. [`ReplaySession`] wraps it
//! with a [`Transport`] and a [`TickGate`] so a caller only has to feed
//! elapsed time and input commands.
//!
//! # Tick rules
//!
//! For every cursor that is not exhausted:
//! - `Rewind`: decrement if the index is above zero
//! - `Forward`: increment; reaching the series length marks it exhausted
//!
//! Exhausted cursors stop moving until the next restart. The session is
//! `Ended` once every cursor is exhausted; with warping that is exactly when
//! the shared index reaches the common length.

use crate::config::ReplayConfig;
use crate::path_trace::{window, PathTrace};
use crate::series::{ChannelId, Sample, TrajectorySeries};
use crate::sync::{SyncPolicy, SynchronizationSet};
use crate::transport::{Direction, TickGate, Transport, TransportCommand, TransportState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Playback position within one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCursor {
    /// Index in `[0, len]`; `len` means the stream is exhausted
    index: usize,
    len: usize,
    exhausted: bool,
}

impl StreamCursor {
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len,
            exhausted: len == 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The last valid sample index at or before the cursor.
    pub fn display_index(&self) -> Option<usize> {
        if self.len == 0 {
            None
        } else {
            Some(self.index.min(self.len - 1))
        }
    }

    /// Moves one step; returns whether the index changed.
    fn step(&mut self, direction: Direction) -> bool {
        if self.exhausted {
            return false;
        }
        match direction {
            Direction::Rewind => {
                if self.index > 0 {
                    self.index -= 1;
                    true
                } else {
                    false
                }
            }
            Direction::Forward => {
                self.index += 1;
                if self.index >= self.len {
                    self.index = self.len;
                    self.exhausted = true;
                }
                true
            }
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.exhausted = self.len == 0;
    }
}

/// Result of one committed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// At least one cursor moved
    Advanced,

    /// No cursor could move (e.g. rewinding at index 0)
    Held,

    /// This tick exhausted the last stream
    Ended,

    /// Paused or already ended; nothing was committed
    Idle,
}

/// Events reported by [`ReplaySession::update`] for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A tick was committed
    Tick { tick: u64, outcome: TickOutcome },

    /// End of data reached; a restart is scheduled
    Ended { tick: u64 },

    /// All cursors were reset to zero; the scene should be reset too
    Restarted { restarts: u64 },
}

/// Cursors of every stream in a synchronization set.
#[derive(Debug, Clone)]
pub struct Playback {
    set: SynchronizationSet,
    cursors: Vec<StreamCursor>,

    /// Shared index, only tracked under [`SyncPolicy::Warp`]
    global: Option<StreamCursor>,

    ended: bool,
    restart_delay: Duration,
    restart_in: Option<Duration>,

    ticks: u64,
    restarts: u64,
}

impl Playback {
    pub fn new(set: SynchronizationSet, restart_delay: Duration) -> Self {
        let cursors = set.streams().iter().map(|s| StreamCursor::new(s.len())).collect();
        let global = set
            .policy()
            .is_warp()
            .then(|| StreamCursor::new(set.common_length()));
        Self {
            set,
            cursors,
            global,
            ended: false,
            restart_delay,
            restart_in: None,
            ticks: 0,
            restarts: 0,
        }
    }

    pub fn set(&self) -> &SynchronizationSet {
        &self.set
    }

    pub fn cursors(&self) -> &[StreamCursor] {
        &self.cursors
    }

    pub fn cursor(&self, stream: usize) -> Option<&StreamCursor> {
        self.cursors.get(stream)
    }

    /// The shared index; `None` when streams advance independently.
    pub fn global_index(&self) -> Option<usize> {
        self.global.map(|g| g.index())
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Remaining settle time before a scheduled restart.
    pub fn pending_restart(&self) -> Option<Duration> {
        self.restart_in
    }

    /// Committed ticks since construction.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn restart_count(&self) -> u64 {
        self.restarts
    }

    pub fn state(&self, transport: &Transport) -> TransportState {
        if self.ended {
            TransportState::Ended
        } else if !transport.is_playing() {
            TransportState::Paused
        } else {
            TransportState::Playing(transport.direction())
        }
    }

    /// Commits one step in the transport's direction.
    pub fn tick(&mut self, transport: &Transport) -> TickOutcome {
        if self.ended || !transport.is_playing() {
            return TickOutcome::Idle;
        }

        let direction = transport.direction();
        let mut moved = false;
        for cursor in &mut self.cursors {
            moved |= cursor.step(direction);
        }
        if let Some(global) = self.global.as_mut() {
            global.step(direction);
        }
        self.ticks += 1;

        let all_exhausted = match self.global {
            Some(global) => global.is_exhausted(),
            None => self.cursors.iter().all(StreamCursor::is_exhausted),
        };

        if all_exhausted {
            self.ended = true;
            self.schedule_restart();
            info!(tick = self.ticks, "end of data reached");
            TickOutcome::Ended
        } else if moved {
            TickOutcome::Advanced
        } else {
            TickOutcome::Held
        }
    }

    /// Schedules a restart after the settle delay. An already pending restart
    /// keeps its earlier deadline.
    pub fn request_restart(&mut self) {
        self.schedule_restart();
    }

    fn schedule_restart(&mut self) {
        if self.restart_in.is_none() {
            debug!(delay_ms = self.restart_delay.as_millis() as u64, "restart scheduled");
            self.restart_in = Some(self.restart_delay);
        }
    }

    /// Counts down a pending restart; returns true when it fired.
    pub fn advance_restart_timer(&mut self, dt: Duration) -> bool {
        match self.restart_in {
            Some(remaining) if remaining <= dt => {
                self.restart();
                true
            }
            Some(remaining) => {
                self.restart_in = Some(remaining - dt);
                false
            }
            None => false,
        }
    }

    /// Resets every cursor to zero and clears the end-of-data state.
    pub fn restart(&mut self) {
        for cursor in &mut self.cursors {
            cursor.reset();
        }
        if let Some(global) = self.global.as_mut() {
            global.reset();
        }
        self.ended = false;
        self.restart_in = None;
        self.restarts += 1;
        info!(restarts = self.restarts, "playback restarted");
    }

    /// Current sample of one channel of one stream, held at the last sample
    /// once the stream is exhausted.
    pub fn current_sample(&self, stream: usize, channel: &ChannelId) -> Option<&Sample> {
        let series = self.set.get(stream)?;
        let index = self.cursors.get(stream)?.display_index()?;
        series.sample(channel, index)
    }

    /// Path trace of one stream around its cursor.
    pub fn trace(&self, stream: usize, channel: &ChannelId, size: usize) -> Option<PathTrace<'_>> {
        let series = self.set.get(stream)?;
        let cursor = self.cursors.get(stream)?;
        window(series, channel, cursor.index(), size)
    }

    /// Iterates `(series, cursor)` pairs in input order.
    pub fn streams(&self) -> impl Iterator<Item = (&Arc<TrajectorySeries>, &StreamCursor)> {
        self.set.streams().iter().zip(self.cursors.iter())
    }
}

/// A playback with its transport, tick gate and trace settings.
///
/// The caller feeds elapsed time through [`update`](Self::update) and input
/// through [`apply`](Self::apply); everything else happens here.
#[derive(Debug, Clone)]
pub struct ReplaySession {
    playback: Playback,
    transport: Transport,
    gate: TickGate,
    trace_channel: ChannelId,
    trace_window: usize,
}

impl ReplaySession {
    pub fn new(set: SynchronizationSet, config: &ReplayConfig) -> Self {
        Self {
            playback: Playback::new(set, config.restart_delay()),
            transport: Transport::new(config.initial_speed, config.max_playback_speed),
            gate: TickGate::new(config.frame_interval()),
            trace_channel: config.trace_channel.clone(),
            trace_window: config.trace_window,
        }
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn policy(&self) -> SyncPolicy {
        self.playback.set().policy()
    }

    pub fn state(&self) -> TransportState {
        self.playback.state(&self.transport)
    }

    pub fn trace_channel(&self) -> &ChannelId {
        &self.trace_channel
    }

    /// Applies one input command.
    pub fn apply(&mut self, command: TransportCommand) {
        debug!(?command, "transport command");
        match command {
            TransportCommand::RequestRestart => self.playback.request_restart(),
            other => self.transport.apply(other),
        }
    }

    /// Advances wall time by `dt`. Commits at most one tick.
    pub fn update(&mut self, dt: Duration) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();

        if self.playback.advance_restart_timer(dt) {
            self.transport.reset_for_restart();
            self.gate.reset();
            events.push(PlaybackEvent::Restarted {
                restarts: self.playback.restart_count(),
            });
            return events;
        }

        if self.playback.is_ended() || !self.transport.is_playing() {
            return events;
        }

        if self.gate.advance(dt, &self.transport) {
            let outcome = self.playback.tick(&self.transport);
            let tick = self.playback.tick_count();
            events.push(PlaybackEvent::Tick { tick, outcome });
            if outcome == TickOutcome::Ended {
                events.push(PlaybackEvent::Ended { tick });
            }
        }

        events
    }

    /// Trace of the configured channel for one stream.
    pub fn trace(&self, stream: usize) -> Option<PathTrace<'_>> {
        self.playback
            .trace(stream, &self.trace_channel, self.trace_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Sample;

    fn tip() -> ChannelId {
        ChannelId::from(ChannelId::INSTRUMENT_TIP)
    }

    fn series(key: &str, len: usize) -> TrajectorySeries {
        let samples = (0..len).map(|i| Sample::new(i as f64, 0.0, 0.0)).collect();
        TrajectorySeries::new(key, vec![(tip(), samples)]).unwrap()
    }

    fn playback(lengths: &[usize], warp: bool) -> Playback {
        let streams = lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| series(&format!("s{}", i), len))
            .collect();
        let set = SynchronizationSet::build(streams, warp).unwrap();
        Playback::new(set, Duration::from_secs(1))
    }

    #[test]
    fn test_forward_until_ended() {
        let mut pb = playback(&[10], true);
        let transport = Transport::new(1.0, 10.0);

        for _ in 0..9 {
            assert_eq!(pb.tick(&transport), TickOutcome::Advanced);
        }
        assert_eq!(pb.global_index(), Some(9));
        assert_eq!(pb.tick(&transport), TickOutcome::Ended);
        assert!(pb.is_ended());
        assert_eq!(pb.state(&transport), TransportState::Ended);
        assert_eq!(pb.global_index(), Some(10));

        // Further ticks are clamped
        assert_eq!(pb.tick(&transport), TickOutcome::Idle);
        assert_eq!(pb.global_index(), Some(10));
    }

    #[test]
    fn test_restart_after_settle_delay() {
        let mut pb = playback(&[10, 4], true);
        let transport = Transport::new(1.0, 10.0);
        for _ in 0..10 {
            pb.tick(&transport);
        }
        assert!(pb.is_ended());
        assert_eq!(pb.pending_restart(), Some(Duration::from_secs(1)));

        assert!(!pb.advance_restart_timer(Duration::from_millis(600)));
        assert!(pb.is_ended());
        assert!(pb.advance_restart_timer(Duration::from_millis(400)));

        assert!(!pb.is_ended());
        assert!(pb.cursors().iter().all(|c| c.index() == 0 && !c.is_exhausted()));
        assert_eq!(pb.global_index(), Some(0));
        assert_eq!(pb.restart_count(), 1);
    }

    #[test]
    fn test_rewind_clamps_at_zero() {
        let mut pb = playback(&[5], true);
        let mut transport = Transport::new(1.0, 10.0);
        pb.tick(&transport);
        pb.tick(&transport);
        transport.set_direction(Direction::Rewind);
        assert_eq!(pb.tick(&transport), TickOutcome::Advanced);
        assert_eq!(pb.tick(&transport), TickOutcome::Advanced);
        assert_eq!(pb.tick(&transport), TickOutcome::Held);
        assert_eq!(pb.global_index(), Some(0));
        assert_eq!(pb.state(&transport), TransportState::Playing(Direction::Rewind));
    }

    #[test]
    fn test_paused_transport_commits_nothing() {
        let mut pb = playback(&[5], true);
        let mut transport = Transport::new(1.0, 10.0);
        transport.toggle_pause();
        assert_eq!(pb.tick(&transport), TickOutcome::Idle);
        assert_eq!(pb.tick_count(), 0);
        assert_eq!(pb.state(&transport), TransportState::Paused);
    }

    #[test]
    fn test_independent_streams_exhaust_separately() {
        let mut pb = playback(&[3, 6], false);
        let transport = Transport::new(1.0, 10.0);
        assert_eq!(pb.global_index(), None);

        for _ in 0..3 {
            pb.tick(&transport);
        }
        assert!(pb.cursor(0).unwrap().is_exhausted());
        assert!(!pb.cursor(1).unwrap().is_exhausted());
        assert!(!pb.is_ended());

        // The exhausted stream holds its last sample
        assert_eq!(pb.current_sample(0, &tip()), Some(&Sample::new(2.0, 0.0, 0.0)));

        for _ in 0..2 {
            assert_eq!(pb.tick(&transport), TickOutcome::Advanced);
        }
        assert_eq!(pb.tick(&transport), TickOutcome::Ended);
    }

    #[test]
    fn test_exhausted_stream_ignores_rewind() {
        let mut pb = playback(&[2, 6], false);
        let mut transport = Transport::new(1.0, 10.0);
        pb.tick(&transport);
        pb.tick(&transport);
        transport.set_direction(Direction::Rewind);
        pb.tick(&transport);
        assert_eq!(pb.cursor(0).unwrap().index(), 2);
        assert_eq!(pb.cursor(1).unwrap().index(), 1);
    }

    #[test]
    fn test_warped_streams_share_index() {
        let mut pb = playback(&[7, 13, 4], true);
        let transport = Transport::new(1.0, 10.0);
        for _ in 0..5 {
            pb.tick(&transport);
        }
        assert!(pb.cursors().iter().all(|c| c.index() == 5 && c.len() == 13));
    }

    #[test]
    fn test_request_restart_keeps_earliest_deadline() {
        let mut pb = playback(&[10], true);
        pb.request_restart();
        pb.advance_restart_timer(Duration::from_millis(700));
        pb.request_restart();
        assert_eq!(pb.pending_restart(), Some(Duration::from_millis(300)));
    }

    fn session(lengths: &[usize], config: ReplayConfig) -> ReplaySession {
        let streams = lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| series(&format!("s{}", i), len))
            .collect();
        let set = SynchronizationSet::build(streams, config.warp_enabled).unwrap();
        ReplaySession::new(set, &config)
    }

    fn fast_config() -> ReplayConfig {
        ReplayConfig {
            frame_interval_ms: 100,
            restart_delay_ms: 250,
            trace_window: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_session_gates_ticks_by_speed() {
        let mut s = session(&[50], fast_config());

        assert!(s.update(Duration::from_millis(50)).is_empty());
        let events = s.update(Duration::from_millis(50));
        assert_eq!(
            events,
            vec![PlaybackEvent::Tick { tick: 1, outcome: TickOutcome::Advanced }]
        );

        // At 4x speed every 25ms step commits
        s.apply(TransportCommand::AdjustSpeed(3.0));
        for _ in 0..4 {
            assert_eq!(s.update(Duration::from_millis(25)).len(), 1);
        }
        assert_eq!(s.playback().global_index(), Some(5));
    }

    #[test]
    fn test_session_end_and_restart() {
        let mut s = session(&[10, 6], fast_config());
        s.apply(TransportCommand::SetDirection(Direction::Rewind));
        s.apply(TransportCommand::SetDirection(Direction::Forward));

        let dt = Duration::from_millis(100);
        let mut ended_at = None;
        for _ in 0..10 {
            for event in s.update(dt) {
                if let PlaybackEvent::Ended { tick } = event {
                    ended_at = Some(tick);
                }
            }
        }
        assert_eq!(ended_at, Some(10));
        assert_eq!(s.state(), TransportState::Ended);

        // Settle delay of 250ms: two updates wait, the third restarts
        assert!(s.update(dt).is_empty());
        assert!(s.update(dt).is_empty());
        assert_eq!(s.update(dt), vec![PlaybackEvent::Restarted { restarts: 1 }]);

        assert_eq!(s.state(), TransportState::Playing(Direction::Forward));
        assert!(s.playback().cursors().iter().all(|c| c.index() == 0));
    }

    #[test]
    fn test_session_restart_resets_direction() {
        let mut s = session(&[10], fast_config());
        s.apply(TransportCommand::SetDirection(Direction::Rewind));
        s.apply(TransportCommand::RequestRestart);
        let dt = Duration::from_millis(100);
        s.update(dt);
        s.update(dt);
        assert_eq!(s.update(dt), vec![PlaybackEvent::Restarted { restarts: 1 }]);
        assert_eq!(s.transport().direction(), Direction::Forward);
    }

    #[test]
    fn test_session_speed_zero_pauses() {
        let mut s = session(&[10], fast_config());
        s.apply(TransportCommand::AdjustSpeed(-1.0));
        assert_eq!(s.state(), TransportState::Paused);
        for _ in 0..20 {
            assert!(s.update(Duration::from_millis(100)).is_empty());
        }
        assert_eq!(s.playback().global_index(), Some(0));
    }

    #[test]
    fn test_session_trace_follows_cursor() {
        let mut s = session(&[20], fast_config());
        for _ in 0..5 {
            s.update(Duration::from_millis(100));
        }
        let trace = s.trace(0).unwrap();
        assert_eq!(trace.past_count, 2);
        assert_eq!(trace.future_count, 2);
        let xs: Vec<f64> = trace.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3.0, 4.0, 5.0, 6.0]);
    }
}
