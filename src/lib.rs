pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod demo;
pub mod diagnostics;
pub mod event_loop;
pub mod logging;
pub mod midi;
pub mod model;
pub mod playback;
pub mod record;
pub mod ring_buffer;
pub mod sequencer;
pub mod tick_scheduler;
pub mod transport;
pub mod ui;

pub use cli::Args;
pub use commands::{Command, CommandError};
pub use config::Settings;
pub use event_loop::{EngineMessage, EventLoop};
pub use model::{Note, Pattern, Track};
pub use sequencer::Sequencer;
pub use tick_scheduler::{Tick, TickScheduler};
pub use transport::{TickWindow, Transport, TransportState};
