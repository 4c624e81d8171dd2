//! MIDI functionality for the sequencer
//!
//! This module provides the output side of the real-time pipeline:
//! - Wire-level MIDI message types and error handling
//! - The [`EventDispatcher`] holding micro-timed events until they are due
//! - Real MIDI device communication via midir
//! - A recording mock for tests
//!
mod dispatcher;
mod engine;
pub mod input;
pub mod midir_engine;
pub mod mock_engine;

pub use dispatcher::{is_due, EventDispatcher, MidiEvent};
pub use engine::{MidiEngine, MidiError, MidiMessage, Result, CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF};

pub use input::LiveInput;
pub use midir_engine::{list_output_devices, MidirEngine};
pub use mock_engine::MockMidiEngine;
