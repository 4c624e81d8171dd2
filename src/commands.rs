//! Pattern and transport commands accepted from UI or serial collaborators.
//!
//! Every command is range-checked by [`Command::validate`] before it touches
//! any state, so a rejected command leaves the sequencer exactly as it was.

use crate::config::{CHANNEL_RANGE, STEP_COUNT_RANGE, TEMPO_RANGE};
use crate::model::is_valid_grid_division;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetTempo(f32),
    SetStepCount(u16),
    SetGridDivision(u8),
    SetChannel(u8),
    Locate(u32),
    Arm(bool),
    Start,
    Stop,
    Pause,
    Resume,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    TempoOutOfRange(f32),
    StepCountOutOfRange(u16),
    InvalidGridDivision(u8),
    ChannelOutOfRange(u8),
    /// A command line that could not be understood
    Unrecognized(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::TempoOutOfRange(bpm) => write!(
                f,
                "tempo {} outside {}..{} BPM",
                bpm,
                TEMPO_RANGE.start(),
                TEMPO_RANGE.end()
            ),
            CommandError::StepCountOutOfRange(steps) => write!(
                f,
                "step count {} outside {}..{}",
                steps,
                STEP_COUNT_RANGE.start(),
                STEP_COUNT_RANGE.end()
            ),
            CommandError::InvalidGridDivision(grid) => {
                write!(f, "grid division {} does not give whole-tick steps", grid)
            }
            CommandError::ChannelOutOfRange(ch) => write!(
                f,
                "channel {} outside {}..{}",
                ch,
                CHANNEL_RANGE.start(),
                CHANNEL_RANGE.end()
            ),
            CommandError::Unrecognized(line) => write!(f, "unknown command '{}'", line),
        }
    }
}

impl Error for CommandError {}

impl Command {
    pub fn validate(&self) -> Result<(), CommandError> {
        match *self {
            Command::SetTempo(bpm) if !TEMPO_RANGE.contains(&bpm) => {
                Err(CommandError::TempoOutOfRange(bpm))
            }
            Command::SetStepCount(steps) if !STEP_COUNT_RANGE.contains(&steps) => {
                Err(CommandError::StepCountOutOfRange(steps))
            }
            Command::SetGridDivision(grid) if !is_valid_grid_division(grid) => {
                Err(CommandError::InvalidGridDivision(grid))
            }
            Command::SetChannel(ch) if !CHANNEL_RANGE.contains(&ch) => {
                Err(CommandError::ChannelOutOfRange(ch))
            }
            _ => Ok(()),
        }
    }
}
