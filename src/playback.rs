//! Playback engine: decides which notes sound in one transport window.

use crate::config::PULSES_PER_QUARTER_NOTE;
use crate::midi::MidiEvent;
use crate::model::Pattern;
use crate::transport::{micros_per_pulse, TickWindow};
use log::trace;

/// Stateless note scanner. Holds only the musical resolution used to turn
/// micro-offsets into microseconds.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackEngine {
    pulses_per_quarter_note: u16,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        PlaybackEngine {
            pulses_per_quarter_note: PULSES_PER_QUARTER_NOTE,
        }
    }
}

impl PlaybackEngine {
    pub fn new(pulses_per_quarter_note: u16) -> Self {
        PlaybackEngine {
            pulses_per_quarter_note: pulses_per_quarter_note.max(1),
        }
    }

    /// Delay for a note-on offset of `micro_offset_q8` / 256 ticks. Only
    /// positive offsets delay.
    pub fn micro_delay_micros(&self, micro_offset_q8: i16, bpm: f32) -> u32 {
        if micro_offset_q8 <= 0 {
            return 0;
        }
        let pulse = u64::from(micros_per_pulse(bpm, self.pulses_per_quarter_note));
        (u64::from(micro_offset_q8.unsigned_abs()) * pulse / 256) as u32
    }

    /// Appends the note-ons and note-offs falling inside `window`, in track
    /// order. Note-ons are due at `now_micros` plus their micro delay;
    /// note-offs are due immediately.
    pub fn process_window(
        &self,
        window: TickWindow,
        pattern: &Pattern,
        now_micros: u32,
        out: &mut Vec<MidiEvent>,
    ) {
        let loop_len = pattern.ticks().max(1);
        let channel = pattern.track.channel;

        for note in pattern.track.notes() {
            let on = note.on_tick % loop_len;
            let off = ((u64::from(note.on_tick) + u64::from(note.duration_ticks))
                % u64::from(loop_len)) as u32;

            if window.contains(on) && !note.is_muted() {
                let delay = self.micro_delay_micros(note.micro_offset_q8, pattern.tempo);
                trace!("Note on {} at tick {} (+{} µs)", note.pitch, on, delay);
                out.push(MidiEvent::note_on(
                    channel,
                    note.pitch,
                    note.velocity,
                    now_micros.wrapping_add(delay),
                ));
            }
            if window.contains(off) {
                trace!("Note off {} at tick {}", note.pitch, off);
                out.push(MidiEvent::note_off(channel, note.pitch, now_micros));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micro_delay() {
        let engine = PlaybackEngine::default();
        assert_eq!(engine.micro_delay_micros(0, 120.0), 0);
        assert_eq!(engine.micro_delay_micros(-128, 120.0), 0);
        assert_eq!(engine.micro_delay_micros(128, 120.0), 2604);
        assert_eq!(engine.micro_delay_micros(256, 120.0), 5208);
    }
}
