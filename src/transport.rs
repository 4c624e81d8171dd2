//! Transport functionality
//!
//! Turns the ~1 kHz real-time tick stream into musical pulses and hands them
//! out as `(prev, curr]` windows over a looping play position.
//!
//! Phase is accumulated in integer microseconds: each real-time tick adds its
//! period and every whole `micros_per_pulse` becomes one pending pulse. The
//! remainder carries over, so musical time never drifts from the tick source.

use crate::config::{
    BEATS_PER_BAR, DEFAULT_TEMPO, MIDI_CLOCKS_PER_QUARTER_NOTE, PULSES_PER_QUARTER_NOTE,
    TICK_MICROS,
};
use crate::model::ticks_per_step;
use log::{debug, info};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
    Paused,
}

/// Half-open `(prev, curr]` range of musical ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickWindow {
    pub prev: u32,
    pub curr: u32,
}

impl TickWindow {
    /// Wrap-aware containment: a window that crossed the loop end contains
    /// everything after `prev` and everything up to `curr`.
    pub fn contains(&self, tick: u32) -> bool {
        if self.prev < self.curr {
            tick > self.prev && tick <= self.curr
        } else {
            tick > self.prev || tick <= self.curr
        }
    }
}

/// Zero-based position in 4/4 with a sixteenth grid; `ticks` counts inside the
/// current sixteenth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SongPosition {
    pub bars: u32,
    pub beats: u32,
    pub ticks: u32,
}

impl fmt::Display for SongPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{:02}", self.bars + 1, self.beats + 1, self.ticks)
    }
}

/// Derives the pulse length in microseconds, never less than one.
pub fn micros_per_pulse(bpm: f32, pulses_per_quarter_note: u16) -> u32 {
    let pulses_per_minute = bpm * f32::from(pulses_per_quarter_note.max(1));
    if pulses_per_minute <= 0.0 || !pulses_per_minute.is_finite() {
        return u32::MAX;
    }
    ((60_000_000.0 / pulses_per_minute) as u32).max(1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transport {
    tempo_bpm: f32,
    pulses_per_quarter_note: u16,
    micros_per_pulse: u32,
    tick_micros: u32,
    loop_length_ticks: u32,
    play_position_ticks: u32,
    phase_accumulator_micros: u32,
    pending_pulses: u32,
    state: TransportState,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    pub fn new() -> Self {
        Transport {
            tempo_bpm: DEFAULT_TEMPO,
            pulses_per_quarter_note: PULSES_PER_QUARTER_NOTE,
            micros_per_pulse: micros_per_pulse(DEFAULT_TEMPO, PULSES_PER_QUARTER_NOTE),
            tick_micros: TICK_MICROS,
            loop_length_ticks: 1,
            play_position_ticks: 0,
            phase_accumulator_micros: 0,
            pending_pulses: 0,
            state: TransportState::Stopped,
        }
    }

    /// Real-time period credited per `on_realtime_tick` (1000 µs by default).
    pub fn with_tick_micros(mut self, tick_micros: u32) -> Self {
        self.tick_micros = tick_micros.max(1);
        self
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo_bpm = bpm;
        self.micros_per_pulse = micros_per_pulse(bpm, self.pulses_per_quarter_note);
        debug!(
            "Tempo set to {} BPM ({} µs per pulse)",
            bpm, self.micros_per_pulse
        );
    }

    pub fn set_pulses_per_quarter_note(&mut self, ppqn: u16) {
        self.pulses_per_quarter_note = ppqn.max(1);
        self.micros_per_pulse = micros_per_pulse(self.tempo_bpm, self.pulses_per_quarter_note);
    }

    /// Zero is treated as one. The play position is re-wrapped into range.
    pub fn set_loop_length(&mut self, ticks: u32) {
        self.loop_length_ticks = ticks.max(1);
        self.play_position_ticks %= self.loop_length_ticks;
        debug!(
            "Loop length set to {} ticks, position {}",
            self.loop_length_ticks, self.play_position_ticks
        );
    }

    /// Stopped/Paused -> Running from position 0. Returns false if already
    /// running.
    pub fn start(&mut self) -> bool {
        if self.state == TransportState::Running {
            return false;
        }
        self.state = TransportState::Running;
        self.play_position_ticks = 0;
        self.phase_accumulator_micros = 0;
        self.pending_pulses = 0;
        info!("Transport started");
        true
    }

    pub fn stop(&mut self) {
        if self.state != TransportState::Stopped {
            info!("Transport stopped");
        }
        self.state = TransportState::Stopped;
        self.play_position_ticks = 0;
        self.phase_accumulator_micros = 0;
        self.pending_pulses = 0;
    }

    /// Running -> Paused, keeping position.
    pub fn pause(&mut self) -> bool {
        if self.state != TransportState::Running {
            return false;
        }
        self.state = TransportState::Paused;
        info!("Transport paused at tick {}", self.play_position_ticks);
        true
    }

    /// Paused -> Running, keeping position.
    pub fn resume(&mut self) -> bool {
        if self.state != TransportState::Paused {
            return false;
        }
        self.state = TransportState::Running;
        info!("Transport resumed at tick {}", self.play_position_ticks);
        true
    }

    pub fn locate(&mut self, tick: u32) {
        self.play_position_ticks = tick % self.loop_length_ticks;
        debug!("Located to tick {}", self.play_position_ticks);
    }

    /// Credits one real-time tick. No-op unless running.
    pub fn on_realtime_tick(&mut self) {
        if self.state != TransportState::Running {
            return;
        }
        self.phase_accumulator_micros = self
            .phase_accumulator_micros
            .saturating_add(self.tick_micros);
        while self.phase_accumulator_micros >= self.micros_per_pulse {
            self.phase_accumulator_micros -= self.micros_per_pulse;
            self.pending_pulses = self.pending_pulses.saturating_add(1);
        }
    }

    /// Consumes one pending pulse, advancing the play position.
    pub fn next(&mut self) -> Option<TickWindow> {
        if self.pending_pulses == 0 {
            return None;
        }
        let prev = self.play_position_ticks;
        self.play_position_ticks = (prev + 1) % self.loop_length_ticks;
        self.pending_pulses -= 1;
        Some(TickWindow {
            prev,
            curr: self.play_position_ticks,
        })
    }

    pub fn song_position(&self) -> SongPosition {
        let step = ticks_per_step(16);
        let steps_per_beat = u32::from(self.pulses_per_quarter_note) / step.max(1);
        let step_index = self.play_position_ticks / step;
        let beat_index = step_index / steps_per_beat.max(1);
        SongPosition {
            bars: beat_index / BEATS_PER_BAR,
            beats: beat_index % BEATS_PER_BAR,
            ticks: self.play_position_ticks % step,
        }
    }

    /// Transport windows per MIDI beat clock (4 at 96 PPQN).
    pub fn clock_divisor(&self) -> u16 {
        (self.pulses_per_quarter_note / MIDI_CLOCKS_PER_QUARTER_NOTE).max(1)
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TransportState::Paused
    }

    pub fn play_tick(&self) -> u32 {
        self.play_position_ticks
    }

    pub fn loop_length(&self) -> u32 {
        self.loop_length_ticks
    }

    pub fn tempo(&self) -> f32 {
        self.tempo_bpm
    }

    pub fn pulses_per_quarter_note(&self) -> u16 {
        self.pulses_per_quarter_note
    }

    pub fn micros_per_pulse(&self) -> u32 {
        self.micros_per_pulse
    }

    pub fn pending_pulses(&self) -> u32 {
        self.pending_pulses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micros_per_pulse_at_120() {
        assert_eq!(micros_per_pulse(120.0, 96), 5208);
    }

    #[test]
    fn test_window_containment() {
        let plain = TickWindow { prev: 1, curr: 2 };
        assert!(plain.contains(2));
        assert!(!plain.contains(1));

        let wrapped = TickWindow { prev: 3, curr: 0 };
        assert!(wrapped.contains(0));
        assert!(!wrapped.contains(3));
        assert!(!wrapped.contains(1));
    }

    #[test]
    fn test_song_position_display() {
        let mut transport = Transport::new();
        transport.set_loop_length(96 * 16);
        transport.locate(96 * 5 + 24 + 7);
        let pos = transport.song_position();
        assert_eq!(pos, SongPosition { bars: 1, beats: 1, ticks: 7 });
        assert_eq!(pos.to_string(), "2:2:07");
    }

    #[test]
    fn test_clock_divisor() {
        assert_eq!(Transport::new().clock_divisor(), 4);
    }
}
