//! Delayed MIDI event dispatch.
//!
//! Events already due go straight to the output. Later ones wait in a small
//! bounded FIFO that `update` drains from the front, stopping at the first
//! event that is not yet due. The queue is not sorted: a due event enqueued
//! behind a later one waits until the later one is released. Two notes in one
//! window with different micro offsets, or a pending test-note off, can delay
//! the events queued after them.

use crate::config::DISPATCH_QUEUE_CAPACITY;
use crate::midi::{MidiEngine, MidiMessage, CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF};
use log::{error, trace, warn};
use std::collections::VecDeque;

/// A note event produced by playback or live input. `channel` is 1-16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub is_note_on: bool,
    pub due_at_micros: u32,
}

impl MidiEvent {
    pub fn note_on(channel: u8, pitch: u8, velocity: u8, due_at_micros: u32) -> Self {
        MidiEvent {
            channel,
            pitch,
            velocity,
            is_note_on: true,
            due_at_micros,
        }
    }

    pub fn note_off(channel: u8, pitch: u8, due_at_micros: u32) -> Self {
        MidiEvent {
            channel,
            pitch,
            velocity: 0,
            is_note_on: false,
            due_at_micros,
        }
    }

    pub fn to_message(&self) -> MidiMessage {
        let channel = status_channel(self.channel);
        if self.is_note_on {
            MidiMessage::NoteOn {
                channel,
                note: self.pitch,
                velocity: self.velocity,
            }
        } else {
            MidiMessage::NoteOff {
                channel,
                note: self.pitch,
                velocity: self.velocity,
            }
        }
    }
}

/// 1-16 to the 0-based status nibble.
fn status_channel(channel: u8) -> u8 {
    channel.wrapping_sub(1) & 0x0F
}

/// True once `now` has reached `due`, across counter wraparound.
pub fn is_due(due_at_micros: u32, now_micros: u32) -> bool {
    now_micros.wrapping_sub(due_at_micros) as i32 >= 0
}

pub struct EventDispatcher<E: MidiEngine> {
    output: E,
    queue: VecDeque<MidiEvent>,
    capacity: usize,
    dropped: u32,
    send_failures: u32,
}

impl<E: MidiEngine> EventDispatcher<E> {
    pub fn new(output: E) -> Self {
        Self::with_capacity(output, DISPATCH_QUEUE_CAPACITY)
    }

    pub fn with_capacity(output: E, capacity: usize) -> Self {
        EventDispatcher {
            output,
            queue: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
            send_failures: 0,
        }
    }

    /// Emits now if due, otherwise queues. A full queue drops the event.
    pub fn send(&mut self, event: MidiEvent, now_micros: u32) {
        if is_due(event.due_at_micros, now_micros) {
            self.emit(event.to_message());
        } else if self.queue.len() < self.capacity {
            trace!(
                "Queued {:?} for {} µs",
                event,
                event.due_at_micros.wrapping_sub(now_micros)
            );
            self.queue.push_back(event);
        } else {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("Dispatch queue full, dropped {:?}", event);
        }
    }

    /// Emits queued events from the front until one is not yet due.
    pub fn update(&mut self, now_micros: u32) {
        while let Some(front) = self.queue.front() {
            if !is_due(front.due_at_micros, now_micros) {
                break;
            }
            if let Some(event) = self.queue.pop_front() {
                self.emit(event.to_message());
            }
        }
    }

    /// Clock and transport messages bypass the queue.
    pub fn send_realtime(&mut self, msg: MidiMessage) {
        self.emit(msg);
    }

    /// All Notes Off and All Sound Off on one channel (1-16).
    pub fn all_notes_off(&mut self, channel: u8) {
        let channel = status_channel(channel);
        for controller in [CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF] {
            self.emit(MidiMessage::ControlChange {
                channel,
                controller,
                value: 0,
            });
        }
    }

    fn emit(&mut self, msg: MidiMessage) {
        if let Err(e) = self.output.send(msg) {
            self.send_failures = self.send_failures.wrapping_add(1);
            error!("Failed to send MIDI message {:?}: {}", msg, e);
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Events lost to a full queue.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn send_failures(&self) -> u32 {
        self.send_failures
    }

    pub fn output(&self) -> &E {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut E {
        &mut self.output
    }
}
