//! Punch-in recording of live note-on/off pairs into the pattern.

use crate::model::{Note, Pattern};
use log::{debug, info};
use std::collections::HashMap;

/// Quantized start of a held live note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRecordNote {
    pub on_tick_quantized: u32,
    pub velocity: u8,
}

#[derive(Debug, Default)]
pub struct RecordEngine {
    armed: bool,
    punching: bool,
    pending: HashMap<u8, PendingRecordNote>,
}

/// Snaps `tick` to the nearest multiple of `step_ticks`, wrapped into the loop.
pub fn quantize(tick: u32, step_ticks: u32, loop_len: u32) -> u32 {
    let step = u64::from(step_ticks.max(1));
    let loop_len = u64::from(loop_len.max(1));
    let nearest = (u64::from(tick) + step / 2) / step;
    ((nearest * step) % loop_len) as u32
}

/// Ticks from `on` to `off`, wrapping past the loop end. Never zero. Both
/// ends are taken modulo `loop_len` first.
pub fn wrapped_duration(on: u32, off: u32, loop_len: u32) -> u32 {
    let loop_len = loop_len.max(1);
    let (on, off) = (on % loop_len, off % loop_len);
    let duration = if off >= on {
        off - on
    } else {
        (loop_len - on) + off
    };
    duration.max(1)
}

impl RecordEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disarming drops any held notes and ends the punch.
    pub fn arm(&mut self, on: bool) {
        self.armed = on;
        if !on {
            self.punching = false;
            self.pending.clear();
        }
        info!("Recording {}", if on { "armed" } else { "disarmed" });
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// True from the first captured note after arming.
    pub fn is_punching(&self) -> bool {
        self.punching
    }

    pub fn pending(&self, pitch: u8) -> Option<PendingRecordNote> {
        self.pending.get(&pitch).copied()
    }

    /// Captures a note start while armed and running. A repeated note-on for
    /// a held pitch replaces the earlier one.
    pub fn on_live_note_on(
        &mut self,
        pattern: &Pattern,
        running: bool,
        pitch: u8,
        velocity: u8,
        current_tick: u32,
    ) {
        if !self.armed || !running || pitch > 127 {
            return;
        }
        self.punching = true;
        let on_tick_quantized = quantize(current_tick, pattern.step_ticks(), pattern.ticks());
        debug!(
            "Record note on {} at tick {} -> {}",
            pitch, current_tick, on_tick_quantized
        );
        self.pending.insert(
            pitch,
            PendingRecordNote {
                on_tick_quantized,
                velocity: velocity & 0x7F,
            },
        );
    }

    /// Closes the held note for `pitch` and writes it into the track. Returns
    /// the written note; a note-off without a held note-on does nothing.
    pub fn on_live_note_off(
        &mut self,
        pattern: &mut Pattern,
        pitch: u8,
        current_tick: u32,
    ) -> Option<Note> {
        let start = self.pending.remove(&pitch)?;
        let loop_len = pattern.ticks().max(1);
        // The loop may have shrunk while the note was held.
        let on = start.on_tick_quantized % loop_len;
        let off = quantize(current_tick, pattern.step_ticks(), loop_len);
        let duration = wrapped_duration(on, off, loop_len);

        let note = Note::new(
            on,
            duration,
            pitch,
            start.velocity,
        );
        pattern.track.insert(note);
        debug!(
            "Recorded note {} on {} for {} ticks",
            pitch, note.on_tick, note.duration_ticks
        );
        Some(note)
    }
}
