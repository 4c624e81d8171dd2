//! Pattern data: notes, the track holding them and the pattern's grid.

use crate::config::{
    DEFAULT_CHANNEL, DEFAULT_GRID_DIVISION, DEFAULT_STEP_COUNT, DEFAULT_TEMPO,
    PULSES_PER_QUARTER_NOTE,
};

/// Ticks in one step of a 4/4 bar split into `grid_division` steps
/// (96 * 4 / 16 = 24 for sixteenths).
pub fn ticks_per_step(grid_division: u8) -> u32 {
    (u32::from(PULSES_PER_QUARTER_NOTE) * 4) / u32::from(grid_division.max(1))
}

/// A grid division is usable when it splits a bar into whole ticks and steps
/// are at least one tick apart within a quarter note's resolution.
pub fn is_valid_grid_division(grid_division: u8) -> bool {
    let bar = u32::from(PULSES_PER_QUARTER_NOTE) * 4;
    (1..=PULSES_PER_QUARTER_NOTE).contains(&u16::from(grid_division))
        && bar % u32::from(grid_division) == 0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Note {
    pub on_tick: u32,
    pub duration_ticks: u32,
    pub pitch: u8,
    pub velocity: u8,
    /// Signed sub-tick offset in 1/256 tick. Only positive values delay.
    pub micro_offset_q8: i16,
    pub flags: u8,
}

impl Note {
    /// The note-on is suppressed; the note-off still fires.
    pub const MUTED: u8 = 1 << 0;

    pub fn new(on_tick: u32, duration_ticks: u32, pitch: u8, velocity: u8) -> Self {
        Note {
            on_tick,
            duration_ticks,
            pitch: pitch & 0x7F,
            velocity: velocity & 0x7F,
            micro_offset_q8: 0,
            flags: 0,
        }
    }

    pub fn with_micro_offset(mut self, micro_offset_q8: i16) -> Self {
        self.micro_offset_q8 = micro_offset_q8;
        self
    }

    pub fn muted(mut self) -> Self {
        self.flags |= Self::MUTED;
        self
    }

    pub fn is_muted(&self) -> bool {
        self.flags & Self::MUTED != 0
    }
}

/// Time-sorted notes on one MIDI channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    notes: Vec<Note>,
    pub channel: u8,
}

impl Default for Track {
    fn default() -> Self {
        Track {
            notes: Vec::new(),
            channel: DEFAULT_CHANNEL,
        }
    }
}

impl Track {
    pub fn new(channel: u8) -> Self {
        Track {
            notes: Vec::new(),
            channel,
        }
    }

    /// Inserts after any note starting on the same tick, keeping the track
    /// sorted by `on_tick` and stable in insertion order.
    pub fn insert(&mut self, note: Note) {
        let index = self.notes.partition_point(|n| n.on_tick <= note.on_tick);
        self.notes.insert(index, note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub track: Track,
    step_count: u16,
    grid_division: u8,
    pub tempo: f32,
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern {
            track: Track::default(),
            step_count: DEFAULT_STEP_COUNT,
            grid_division: DEFAULT_GRID_DIVISION,
            tempo: DEFAULT_TEMPO,
        }
    }
}

impl Pattern {
    pub fn new(step_count: u16, grid_division: u8, tempo: f32) -> Self {
        Pattern {
            track: Track::default(),
            step_count: step_count.max(1),
            grid_division: grid_division.max(1),
            tempo,
        }
    }

    /// Loop length in ticks.
    pub fn ticks(&self) -> u32 {
        ticks_per_step(self.grid_division) * u32::from(self.step_count)
    }

    pub fn step_ticks(&self) -> u32 {
        ticks_per_step(self.grid_division)
    }

    pub fn step_count(&self) -> u16 {
        self.step_count
    }

    pub fn grid_division(&self) -> u8 {
        self.grid_division
    }

    /// Callers must push the new `ticks()` to the transport.
    pub fn set_step_count(&mut self, step_count: u16) {
        self.step_count = step_count.max(1);
    }

    /// Callers must push the new `ticks()` to the transport.
    pub fn set_grid_division(&mut self, grid_division: u8) {
        self.grid_division = grid_division.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_step() {
        assert_eq!(ticks_per_step(16), 24);
        assert_eq!(ticks_per_step(4), 96);
        assert_eq!(ticks_per_step(1), 384);
    }

    #[test]
    fn test_grid_division_validity() {
        for grid in [1, 2, 3, 4, 6, 8, 12, 16, 24, 32, 48, 64, 96] {
            assert!(is_valid_grid_division(grid), "grid {}", grid);
        }
        for grid in [0, 5, 7, 10, 128, 192] {
            assert!(!is_valid_grid_division(grid), "grid {}", grid);
        }
    }

    #[test]
    fn test_pattern_length() {
        let pattern = Pattern::new(64, 16, 120.0);
        assert_eq!(pattern.ticks(), 64 * 24);
    }

    #[test]
    fn test_track_insert_keeps_time_order() {
        let mut track = Track::new(1);
        track.insert(Note::new(48, 12, 60, 100));
        track.insert(Note::new(0, 12, 62, 100));
        track.insert(Note::new(48, 12, 64, 100));
        track.insert(Note::new(24, 12, 65, 100));

        let order: Vec<(u32, u8)> = track.notes().iter().map(|n| (n.on_tick, n.pitch)).collect();
        assert_eq!(order, vec![(0, 62), (24, 65), (48, 60), (48, 64)]);
    }

    #[test]
    fn test_mute_flag() {
        let note = Note::new(0, 1, 60, 100).muted();
        assert!(note.is_muted());
        assert!(!Note::new(0, 1, 60, 100).is_muted());
    }
}
