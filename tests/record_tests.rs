mod common;

use tickseq::record::RecordEngine;
use tickseq::{Note, Pattern};

/// 4 steps of 4 ticks: a 16-tick loop.
fn sixteen_tick_pattern() -> Pattern {
    let pattern = Pattern::new(4, 96, 120.0);
    assert_eq!(pattern.step_ticks(), 4);
    assert_eq!(pattern.ticks(), 16);
    pattern
}

fn armed() -> RecordEngine {
    common::init_logging();
    let mut record = RecordEngine::new();
    record.arm(true);
    record
}

#[test]
fn test_recorded_note_is_quantized() {
    let mut pattern = sixteen_tick_pattern();
    let mut record = armed();

    record.on_live_note_on(&pattern, true, 60, 100, 5);
    let note = record.on_live_note_off(&mut pattern, 60, 9);

    assert_eq!(note, Some(Note::new(4, 4, 60, 100)));
    assert_eq!(pattern.track.notes(), &[Note::new(4, 4, 60, 100)]);
    assert!(record.is_punching());
}

#[test]
fn test_recorded_note_wraps_loop_end() {
    let mut pattern = sixteen_tick_pattern();
    let mut record = armed();

    record.on_live_note_on(&pattern, true, 62, 80, 13);
    let note = record.on_live_note_off(&mut pattern, 62, 1).unwrap();

    assert_eq!(note.on_tick, 12);
    assert_eq!(note.duration_ticks, 4);
}

#[test]
fn test_zero_length_note_gets_one_tick() {
    let mut pattern = sixteen_tick_pattern();
    let mut record = armed();

    record.on_live_note_on(&pattern, true, 60, 100, 8);
    let note = record.on_live_note_off(&mut pattern, 60, 9).unwrap();
    assert_eq!(note.duration_ticks, 1);
}

#[test]
fn test_repeated_note_on_replaces_pending() {
    let mut pattern = sixteen_tick_pattern();
    let mut record = armed();

    record.on_live_note_on(&pattern, true, 60, 80, 4);
    record.on_live_note_on(&pattern, true, 60, 100, 8);
    let note = record.on_live_note_off(&mut pattern, 60, 12).unwrap();

    assert_eq!(note, Note::new(8, 4, 60, 100));
    assert_eq!(pattern.track.len(), 1);
}

#[test]
fn test_ignored_when_disarmed_or_stopped() {
    let mut pattern = sixteen_tick_pattern();

    let mut record = RecordEngine::new();
    record.on_live_note_on(&pattern, true, 60, 100, 4);
    assert_eq!(record.pending(60), None);

    let mut record = armed();
    record.on_live_note_on(&pattern, false, 60, 100, 4);
    assert_eq!(record.pending(60), None);
    assert_eq!(record.on_live_note_off(&mut pattern, 60, 8), None);
    assert!(pattern.track.is_empty());
}

#[test]
fn test_disarm_discards_held_notes() {
    let mut pattern = sixteen_tick_pattern();
    let mut record = armed();

    record.on_live_note_on(&pattern, true, 60, 100, 4);
    assert!(record.pending(60).is_some());

    record.arm(false);
    assert!(!record.is_punching());
    assert_eq!(record.on_live_note_off(&mut pattern, 60, 8), None);
    assert!(pattern.track.is_empty());
}

#[test]
fn test_loop_shrinking_under_held_note() {
    // 16 sixteenths: 24 ticks per step, 384-tick loop.
    let mut pattern = Pattern::new(16, 16, 120.0);
    let mut record = armed();

    record.on_live_note_on(&pattern, true, 60, 100, 300);
    assert_eq!(record.pending(60).map(|p| p.on_tick_quantized), Some(312));

    pattern.set_step_count(4);
    assert_eq!(pattern.ticks(), 96);

    let note = record.on_live_note_off(&mut pattern, 60, 12).unwrap();
    assert_eq!(note, Note::new(24, 1, 60, 100));
    assert!(note.on_tick < pattern.ticks());
}
