// config.rs

use crate::cli::Args;
use log::{debug, info};
use std::error::Error;
use std::fmt;
use std::ops::RangeInclusive;

/// Real-time tick rate of the interrupt source.
pub const TICK_HZ: u32 = 1000;
pub const TICK_MICROS: u32 = 1_000_000 / TICK_HZ;
/// Hand-off buffer slots (power of two).
pub const RING_BUFFER_CAPACITY: usize = 1024;
/// Musical resolution.
pub const PULSES_PER_QUARTER_NOTE: u16 = 96;
/// MIDI beat clock resolution.
pub const MIDI_CLOCKS_PER_QUARTER_NOTE: u16 = 24;
pub const BEATS_PER_BAR: u32 = 4;
/// Pending delayed MIDI events.
pub const DISPATCH_QUEUE_CAPACITY: usize = 32;

pub const TEMPO_RANGE: RangeInclusive<f32> = 20.0..=300.0;
pub const STEP_COUNT_RANGE: RangeInclusive<u16> = 1..=256;
pub const CHANNEL_RANGE: RangeInclusive<u8> = 1..=16;

pub const DEFAULT_TEMPO: f32 = 120.0;
pub const DEFAULT_STEP_COUNT: u16 = 64;
pub const DEFAULT_GRID_DIVISION: u8 = 16;
pub const DEFAULT_CHANNEL: u8 = 13;
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 100;

const CONFIG_FILE: &str = "tickseq";
const ENV_PREFIX: &str = "TICKSEQ";

#[derive(Debug)]
pub enum ConfigError {
    /// The settings sources could not be read or merged
    Source(String),
    /// A setting was present but out of range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Source(msg) => write!(f, "configuration error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid setting: {}", msg),
        }
    }
}

impl Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Source(e.to_string())
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tempo: f32,
    pub step_count: u16,
    pub grid_division: u8,
    pub channel: u8,
    pub tick_micros: u32,
    pub output_device: Option<String>,
    pub input_device: Option<String>,
    pub autostart: bool,
    pub demo_pattern: bool,
    pub send_test_note: bool,
    pub log_level: String,
    pub status_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tempo: DEFAULT_TEMPO,
            step_count: DEFAULT_STEP_COUNT,
            grid_division: DEFAULT_GRID_DIVISION,
            channel: DEFAULT_CHANNEL,
            tick_micros: TICK_MICROS,
            output_device: None,
            input_device: None,
            autostart: true,
            demo_pattern: false,
            send_test_note: false,
            log_level: "debug".to_string(),
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
        }
    }
}

impl Settings {
    /// Layers defaults, `tickseq.toml` (optional, or `--config`), `TICKSEQ_*`
    /// environment variables and finally command-line flags.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let file = args.config.as_deref().unwrap_or(CONFIG_FILE);
        debug!("Loading settings from '{}' and {}_* variables", file, ENV_PREFIX);

        let source = config::Config::builder()
            .set_default("tempo", f64::from(defaults.tempo))?
            .set_default("steps", i64::from(defaults.step_count))?
            .set_default("grid", i64::from(defaults.grid_division))?
            .set_default("channel", i64::from(defaults.channel))?
            .set_default("tick_micros", i64::from(defaults.tick_micros))?
            .set_default("autostart", defaults.autostart)?
            .set_default("demo", defaults.demo_pattern)?
            .set_default("log_level", defaults.log_level.clone())?
            .set_default("status_interval_ms", defaults.status_interval_ms as i64)?
            .add_source(config::File::with_name(file).required(args.config.is_some()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let mut settings = Settings {
            tempo: source.get_float("tempo")? as f32,
            step_count: narrow("steps", source.get_int("steps")?)?,
            grid_division: narrow("grid", source.get_int("grid")?)?,
            channel: narrow("channel", source.get_int("channel")?)?,
            tick_micros: narrow("tick_micros", source.get_int("tick_micros")?)?,
            output_device: source.get_string("output_device").ok(),
            input_device: source.get_string("input_device").ok(),
            autostart: source.get_bool("autostart")?,
            demo_pattern: source.get_bool("demo")?,
            send_test_note: false,
            log_level: source.get_string("log_level")?,
            status_interval_ms: narrow("status_interval_ms", source.get_int("status_interval_ms")?)?,
        };

        settings.apply_args(args);
        settings.validate()?;
        info!("Settings resolved: {:?}", settings);
        Ok(settings)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(bpm) = args.bpm {
            self.tempo = bpm;
        }
        if let Some(steps) = args.steps {
            self.step_count = steps;
        }
        if let Some(grid) = args.grid {
            self.grid_division = grid;
        }
        if let Some(channel) = args.channel {
            self.channel = channel;
        }
        if let Some(tick) = args.tick_micros {
            self.tick_micros = tick;
        }
        if args.midi_output.is_some() {
            self.output_device = args.midi_output.clone();
        }
        if args.midi_input.is_some() {
            self.input_device = args.midi_input.clone();
        }
        if args.no_autostart {
            self.autostart = false;
        }
        if args.demo {
            self.demo_pattern = true;
        }
        self.send_test_note = args.test_note;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TEMPO_RANGE.contains(&self.tempo) {
            return Err(ConfigError::Invalid(format!(
                "tempo {} outside {:?}",
                self.tempo, TEMPO_RANGE
            )));
        }
        if !STEP_COUNT_RANGE.contains(&self.step_count) {
            return Err(ConfigError::Invalid(format!(
                "step count {} outside {:?}",
                self.step_count, STEP_COUNT_RANGE
            )));
        }
        if !crate::model::is_valid_grid_division(self.grid_division) {
            return Err(ConfigError::Invalid(format!(
                "grid division {} does not divide a bar into whole ticks",
                self.grid_division
            )));
        }
        if !CHANNEL_RANGE.contains(&self.channel) {
            return Err(ConfigError::Invalid(format!(
                "channel {} outside {:?}",
                self.channel, CHANNEL_RANGE
            )));
        }
        if self.tick_micros == 0 {
            return Err(ConfigError::Invalid("tick period must be non-zero".into()));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level
            .parse()
            .unwrap_or(log::LevelFilter::Debug)
    }
}

fn narrow<T: TryFrom<i64>>(key: &str, value: i64) -> Result<T, ConfigError> {
    T::try_from(value).map_err(|_| ConfigError::Invalid(format!("{} = {} out of range", key, value)))
}
