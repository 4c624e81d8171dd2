//! Composition root for the main-context components.
//!
//! Owns the transport, the pattern, the playback and record engines and the
//! dispatcher. Nothing here is shared across threads; the event loop is the
//! only caller.

use crate::commands::{Command, CommandError};
use crate::config::Settings;
use crate::diagnostics::StatusSnapshot;
use crate::midi::{EventDispatcher, MidiEngine, MidiEvent, MidiMessage};
use crate::model::{Note, Pattern};
use crate::playback::PlaybackEngine;
use crate::record::RecordEngine;
use crate::transport::Transport;
use chrono::Local;
use log::{debug, info, warn};

const TEST_NOTE_PITCH: u8 = 60;
const TEST_NOTE_VELOCITY: u8 = 100;
const TEST_NOTE_LENGTH_MICROS: u32 = 200_000;

pub struct Sequencer<E: MidiEngine> {
    transport: Transport,
    pattern: Pattern,
    playback: PlaybackEngine,
    record: RecordEngine,
    dispatcher: EventDispatcher<E>,
    events: Vec<MidiEvent>,
    clock_div: u16,
}

impl<E: MidiEngine> Sequencer<E> {
    /// Loop length and tempo are taken from the pattern.
    pub fn new(pattern: Pattern, output: E) -> Self {
        Self::with_transport(Transport::new(), pattern, output)
    }

    pub fn with_transport(mut transport: Transport, pattern: Pattern, output: E) -> Self {
        transport.set_tempo(pattern.tempo);
        transport.set_loop_length(pattern.ticks());
        Sequencer {
            playback: PlaybackEngine::new(transport.pulses_per_quarter_note()),
            transport,
            pattern,
            record: RecordEngine::new(),
            dispatcher: EventDispatcher::new(output),
            events: Vec::with_capacity(32),
            clock_div: 0,
        }
    }

    pub fn from_settings(settings: &Settings, output: E) -> Self {
        let mut pattern = Pattern::new(settings.step_count, settings.grid_division, settings.tempo);
        pattern.track.channel = settings.channel;
        let transport = Transport::new().with_tick_micros(settings.tick_micros);
        Self::with_transport(transport, pattern, output)
    }

    /// Validates, then applies. A rejected command changes nothing.
    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        if let Err(e) = command.validate() {
            warn!("Rejected {:?}: {}", command, e);
            return Err(e);
        }
        debug!("Applying {:?}", command);

        match command {
            Command::SetTempo(bpm) => {
                self.pattern.tempo = bpm;
                self.transport.set_tempo(bpm);
            }
            Command::SetStepCount(steps) => {
                self.pattern.set_step_count(steps);
                self.transport.set_loop_length(self.pattern.ticks());
            }
            Command::SetGridDivision(grid) => {
                self.pattern.set_grid_division(grid);
                self.transport.set_loop_length(self.pattern.ticks());
            }
            Command::SetChannel(channel) => self.pattern.track.channel = channel,
            Command::Locate(tick) => self.transport.locate(tick),
            Command::Arm(on) => self.record.arm(on),
            Command::Start => {
                if self.transport.start() {
                    self.clock_div = 0;
                    self.dispatcher.send_realtime(MidiMessage::Start);
                }
            }
            Command::Stop => {
                let was_stopped = !self.transport.is_running() && !self.transport.is_paused();
                self.transport.stop();
                self.clock_div = 0;
                if !was_stopped {
                    self.dispatcher.send_realtime(MidiMessage::Stop);
                }
                self.dispatcher.all_notes_off(self.pattern.track.channel);
            }
            Command::Pause => {
                if self.transport.pause() {
                    self.dispatcher.send_realtime(MidiMessage::Stop);
                    self.dispatcher.all_notes_off(self.pattern.track.channel);
                }
            }
            Command::Resume => {
                if self.transport.resume() {
                    self.dispatcher.send_realtime(MidiMessage::Continue);
                }
            }
        }
        Ok(())
    }

    pub fn on_realtime_tick(&mut self) {
        self.transport.on_realtime_tick();
    }

    /// Drains every pending window through the playback engine, emitting a
    /// MIDI clock every `clock_divisor` windows, then hands the collected
    /// events to the dispatcher. Returns the number of windows processed.
    pub fn process_windows(&mut self, now_micros: u32) -> usize {
        let divisor = self.transport.clock_divisor();
        let mut windows = 0;

        while let Some(window) = self.transport.next() {
            self.playback
                .process_window(window, &self.pattern, now_micros, &mut self.events);
            self.clock_div += 1;
            if self.clock_div >= divisor {
                self.dispatcher.send_realtime(MidiMessage::Clock);
                self.clock_div = 0;
            }
            windows += 1;
        }

        for event in self.events.drain(..) {
            self.dispatcher.send(event, now_micros);
        }
        windows
    }

    /// Releases delayed events that have come due.
    pub fn update(&mut self, now_micros: u32) {
        self.dispatcher.update(now_micros);
    }

    /// Echoes the note to the output and offers it to the recorder.
    pub fn live_note_on(&mut self, pitch: u8, velocity: u8, now_micros: u32) {
        let channel = self.pattern.track.channel;
        self.dispatcher
            .send(MidiEvent::note_on(channel, pitch, velocity, now_micros), now_micros);
        self.record.on_live_note_on(
            &self.pattern,
            self.transport.is_running(),
            pitch,
            velocity,
            self.transport.play_tick(),
        );
    }

    pub fn live_note_off(&mut self, pitch: u8, now_micros: u32) -> Option<Note> {
        let channel = self.pattern.track.channel;
        self.dispatcher
            .send(MidiEvent::note_off(channel, pitch, now_micros), now_micros);
        self.record
            .on_live_note_off(&mut self.pattern, pitch, self.transport.play_tick())
    }

    /// Middle C now, released through the delayed queue.
    pub fn send_test_note(&mut self, now_micros: u32) {
        info!("Sending test note (Middle C)");
        let channel = self.pattern.track.channel;
        self.dispatcher.send(
            MidiEvent::note_on(channel, TEST_NOTE_PITCH, TEST_NOTE_VELOCITY, now_micros),
            now_micros,
        );
        self.dispatcher.send(
            MidiEvent::note_off(
                channel,
                TEST_NOTE_PITCH,
                now_micros.wrapping_add(TEST_NOTE_LENGTH_MICROS),
            ),
            now_micros,
        );
    }

    pub fn status(&self, dropped_ticks: u32) -> StatusSnapshot {
        StatusSnapshot {
            play_tick: self.transport.play_tick(),
            position: self.transport.song_position(),
            loop_length: self.transport.loop_length(),
            tempo: self.transport.tempo(),
            state: self.transport.state(),
            armed: self.record.is_armed(),
            dropped_ticks,
            dropped_events: self.dispatcher.dropped(),
            taken_at: Local::now(),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Direct track editing. Loop length follows via `apply`, not here.
    pub fn pattern_mut(&mut self) -> &mut Pattern {
        &mut self.pattern
    }

    pub fn record(&self) -> &RecordEngine {
        &self.record
    }

    pub fn dispatcher(&self) -> &EventDispatcher<E> {
        &self.dispatcher
    }
}
