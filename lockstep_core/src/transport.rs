//! The "TRANSPORT" - playback direction, speed and pause as a value object.
//!
//! The transport holds only the user-controlled flags. It is passed
//! explicitly to every [`Playback::tick`](crate::Playback::tick) so ticks can
//! be tested in isolation. Out-of-range requests are clamped, never reported.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Playback direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Rewind,
}

impl Direction {
    /// Resolves raw forward/rewind input flags.
    ///
    /// Forward wins when both are set; `None` when neither is.
    pub fn from_flags(forward: bool, rewind: bool) -> Option<Self> {
        match (forward, rewind) {
            (true, _) => Some(Direction::Forward),
            (false, true) => Some(Direction::Rewind),
            (false, false) => None,
        }
    }
}

/// Observable playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    Playing(Direction),
    Paused,
    Ended,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Playing(Direction::Forward) => write!(f, "playing(forward)"),
            TransportState::Playing(Direction::Rewind) => write!(f, "playing(rewind)"),
            TransportState::Paused => write!(f, "paused"),
            TransportState::Ended => write!(f, "ended"),
        }
    }
}

/// Commands produced by an input-mapping layer (keyboard, controller, script).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCommand {
    SetDirection(Direction),
    AdjustSpeed(f64),
    TogglePause,
    RequestRestart,
}

/// Direction, speed and pause flags shared by every stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    direction: Direction,
    speed: f64,
    max_speed: f64,
    paused: bool,
}

impl Transport {
    /// Creates a forward-playing transport at `initial_speed`, clamped to
    /// `[0, max_speed]`. A zero initial speed starts paused.
    pub fn new(initial_speed: f64, max_speed: f64) -> Self {
        let max_speed = if max_speed.is_finite() { max_speed.max(0.0) } else { 0.0 };
        let speed = if initial_speed.is_finite() {
            initial_speed.clamp(0.0, max_speed)
        } else {
            0.0
        };
        Self {
            direction: Direction::Forward,
            speed,
            max_speed,
            paused: speed == 0.0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True when a tick would move the cursors.
    pub fn is_playing(&self) -> bool {
        !self.paused && self.speed > 0.0
    }

    /// Takes effect on the next tick.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Changes speed by `delta`, clamped to `[0, max_speed]`.
    ///
    /// Reaching zero forces a pause. Speeding up while paused resumes.
    pub fn adjust_speed(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.speed = (self.speed + delta).clamp(0.0, self.max_speed);
        if self.speed == 0.0 {
            self.paused = true;
        } else if delta > 0.0 {
            self.paused = false;
        }
    }

    /// Flips the pause flag. At zero speed playback stays paused; only a
    /// speed increase resumes it.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.paused = self.speed == 0.0;
        } else {
            self.paused = true;
        }
    }

    /// Applies one input command. `RequestRestart` is owned by the playback
    /// session and ignored here.
    pub fn apply(&mut self, command: TransportCommand) {
        match command {
            TransportCommand::SetDirection(direction) => self.set_direction(direction),
            TransportCommand::AdjustSpeed(delta) => self.adjust_speed(delta),
            TransportCommand::TogglePause => self.toggle_pause(),
            TransportCommand::RequestRestart => {}
        }
    }

    /// State after a restart: forward, same speed, playing unless the speed
    /// is zero.
    pub fn reset_for_restart(&mut self) {
        self.direction = Direction::Forward;
        self.paused = self.speed == 0.0;
    }

    /// Minimum wall time between committed ticks at the current speed.
    ///
    /// `None` when no tick is ever due: zero speed, or a speed so small the
    /// interval does not fit in a `Duration`.
    pub fn gating_interval(&self, frame_interval: Duration) -> Option<Duration> {
        if self.speed > 0.0 {
            Duration::try_from_secs_f64(frame_interval.as_secs_f64() / self.speed).ok()
        } else {
            None
        }
    }
}

/// Decides when the next tick is committed.
///
/// Elapsed time accumulates while playing; a tick fires once it reaches the
/// transport's [`gating_interval`](Transport::gating_interval), after which the
/// accumulator restarts from zero. Higher speed shortens the wait but never
/// changes the step size.
#[derive(Debug, Clone)]
pub struct TickGate {
    frame_interval: Duration,
    elapsed: Duration,
}

impl TickGate {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            elapsed: Duration::ZERO,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Accumulates `dt` and reports whether a tick is due for `transport`.
    pub fn advance(&mut self, dt: Duration, transport: &Transport) -> bool {
        let Some(interval) = transport.gating_interval(self.frame_interval) else {
            return false;
        };
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed >= interval {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}
