//! Scripted input sequences.
//!
//! A script stands in for the keyboard or controller mapping: it emits
//! transport commands at fixed driver steps, so a replay with scrubbing,
//! speed changes and restarts can be reproduced exactly.

use lockstep_core::{Direction, TransportCommand};
use std::collections::BTreeMap;

/// Script identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptId {
    /// Play forward at the initial speed, no input
    Straight,

    /// Rewind for a stretch in the middle, then resume forward
    RewindMidway,

    /// Speed up in steps, then slow down to a hard pause and recover
    SpeedRamp,

    /// Pause, change direction while paused, resume
    PauseResume,

    /// Request a restart partway through
    Restart,
}

impl ScriptId {
    /// Returns a list of all scripts.
    pub fn all() -> Vec<ScriptId> {
        vec![
            ScriptId::Straight,
            ScriptId::RewindMidway,
            ScriptId::SpeedRamp,
            ScriptId::PauseResume,
            ScriptId::Restart,
        ]
    }

    /// Returns the script name.
    pub fn name(&self) -> &'static str {
        match self {
            ScriptId::Straight => "straight",
            ScriptId::RewindMidway => "rewind_midway",
            ScriptId::SpeedRamp => "speed_ramp",
            ScriptId::PauseResume => "pause_resume",
            ScriptId::Restart => "restart",
        }
    }

    /// Returns a description of the script.
    pub fn description(&self) -> &'static str {
        match self {
            ScriptId::Straight => "Forward playback, no input",
            ScriptId::RewindMidway => "Rewind from step 200 to 300, then forward again",
            ScriptId::SpeedRamp => "Three speed-ups, slow down to a hard pause, speed up again",
            ScriptId::PauseResume => "Pause at step 100, reverse while paused, resume at 200",
            ScriptId::Restart => "Request a restart at step 150",
        }
    }

    /// Builds the command schedule. `speed_step` is the size of one
    /// speed-up/slow-down input.
    pub fn script(&self, speed_step: f64) -> InputScript {
        let mut script = InputScript::new();
        match self {
            ScriptId::Straight => {}
            ScriptId::RewindMidway => {
                script.at(200, TransportCommand::SetDirection(Direction::Rewind));
                script.at(300, TransportCommand::SetDirection(Direction::Forward));
            }
            ScriptId::SpeedRamp => {
                script.at(50, TransportCommand::AdjustSpeed(speed_step));
                script.at(100, TransportCommand::AdjustSpeed(speed_step));
                script.at(150, TransportCommand::AdjustSpeed(speed_step));
                // Far below zero: clamps to 0 and forces a pause
                script.at(200, TransportCommand::AdjustSpeed(-4.0 * speed_step));
                script.at(250, TransportCommand::AdjustSpeed(speed_step));
            }
            ScriptId::PauseResume => {
                script.at(100, TransportCommand::TogglePause);
                script.at(150, TransportCommand::SetDirection(Direction::Rewind));
                script.at(200, TransportCommand::TogglePause);
                script.at(260, TransportCommand::SetDirection(Direction::Forward));
            }
            ScriptId::Restart => {
                script.at(150, TransportCommand::RequestRestart);
            }
        }
        script
    }
}

impl std::fmt::Display for ScriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScriptId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "straight" | "none" => Ok(ScriptId::Straight),
            "rewind_midway" | "rewind" => Ok(ScriptId::RewindMidway),
            "speed_ramp" | "speed" => Ok(ScriptId::SpeedRamp),
            "pause_resume" | "pause" => Ok(ScriptId::PauseResume),
            "restart" => Ok(ScriptId::Restart),
            _ => Err(format!("Unknown script: {}", s)),
        }
    }
}

/// Transport commands keyed by the driver step they fire on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputScript {
    commands: BTreeMap<u64, Vec<TransportCommand>>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `command` for `step`. Several commands on one step fire in
    /// insertion order.
    pub fn at(&mut self, step: u64, command: TransportCommand) -> &mut Self {
        self.commands.entry(step).or_default().push(command);
        self
    }

    /// Commands due at `step`.
    pub fn commands_at(&self, step: u64) -> &[TransportCommand] {
        self.commands
            .get(&step)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total scheduled commands.
    pub fn len(&self) -> usize {
        self.commands.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
