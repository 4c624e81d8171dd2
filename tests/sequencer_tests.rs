mod common;

use tickseq::midi::{MidiMessage, MockMidiEngine, CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF};
use tickseq::{Command, CommandError, Note, Pattern, Sequencer, TransportState};

// Default track channel 13 is status nibble 12.
const CH: u8 = 12;

fn sequencer() -> (Sequencer<MockMidiEngine>, MockMidiEngine) {
    common::init_logging();
    let output = MockMidiEngine::new();
    let sequencer = Sequencer::new(Pattern::new(16, 16, 120.0), output.clone());
    (sequencer, output)
}

fn notes_off() -> Vec<MidiMessage> {
    [CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF]
        .iter()
        .map(|&controller| MidiMessage::ControlChange {
            channel: CH,
            controller,
            value: 0,
        })
        .collect()
}

#[test]
fn test_loop_length_follows_pattern() {
    let (mut seq, _) = sequencer();
    assert_eq!(seq.transport().loop_length(), 384);

    seq.apply(Command::SetStepCount(32)).unwrap();
    assert_eq!(seq.transport().loop_length(), 768);

    seq.apply(Command::SetGridDivision(8)).unwrap();
    assert_eq!(seq.pattern().step_ticks(), 48);
    assert_eq!(seq.transport().loop_length(), 1536);
}

#[test]
fn test_rejected_commands_change_nothing() {
    let (mut seq, output) = sequencer();
    let before = seq.pattern().clone();

    assert_eq!(
        seq.apply(Command::SetTempo(500.0)),
        Err(CommandError::TempoOutOfRange(500.0))
    );
    assert_eq!(
        seq.apply(Command::SetGridDivision(7)),
        Err(CommandError::InvalidGridDivision(7))
    );
    assert_eq!(
        seq.apply(Command::SetStepCount(0)),
        Err(CommandError::StepCountOutOfRange(0))
    );
    assert_eq!(
        seq.apply(Command::SetChannel(17)),
        Err(CommandError::ChannelOutOfRange(17))
    );

    assert_eq!(seq.pattern(), &before);
    assert_eq!(seq.transport().tempo(), 120.0);
    assert_eq!(seq.transport().loop_length(), 384);
    assert!(output.sent().is_empty());
}

#[test]
fn test_clock_every_fourth_window() {
    let (mut seq, output) = sequencer();
    seq.apply(Command::Start).unwrap();
    assert_eq!(output.take_sent(), vec![MidiMessage::Start]);

    for _ in 0..42 {
        seq.on_realtime_tick();
    }
    assert_eq!(seq.process_windows(0), 8);
    assert_eq!(output.sent(), vec![MidiMessage::Clock, MidiMessage::Clock]);
    assert_eq!(seq.transport().play_tick(), 8);
}

#[test]
fn test_pattern_notes_reach_output() {
    let (mut seq, output) = sequencer();
    seq.pattern_mut().track.insert(Note::new(2, 1, 60, 100));
    seq.apply(Command::Start).unwrap();
    output.take_sent();

    for _ in 0..16 {
        seq.on_realtime_tick();
    }
    seq.process_windows(0);

    let notes: Vec<_> = output
        .sent()
        .into_iter()
        .filter(|m| m != &MidiMessage::Clock)
        .collect();
    assert_eq!(
        notes,
        vec![
            MidiMessage::NoteOn {
                channel: CH,
                note: 60,
                velocity: 100
            },
            MidiMessage::NoteOff {
                channel: CH,
                note: 60,
                velocity: 0
            },
        ]
    );
}

#[test]
fn test_pause_silences_and_resume_continues() {
    let (mut seq, output) = sequencer();
    seq.apply(Command::Start).unwrap();
    output.take_sent();

    seq.apply(Command::Pause).unwrap();
    let mut expected = vec![MidiMessage::Stop];
    expected.extend(notes_off());
    assert_eq!(output.take_sent(), expected);

    seq.apply(Command::Resume).unwrap();
    assert_eq!(output.take_sent(), vec![MidiMessage::Continue]);
    assert_eq!(seq.transport().state(), TransportState::Running);
}

#[test]
fn test_stop_always_silences_channel() {
    let (mut seq, output) = sequencer();
    seq.apply(Command::Start).unwrap();
    output.take_sent();

    seq.apply(Command::Stop).unwrap();
    let mut expected = vec![MidiMessage::Stop];
    expected.extend(notes_off());
    assert_eq!(output.take_sent(), expected);

    // Already stopped: no transport message, but still all-notes-off.
    seq.apply(Command::Stop).unwrap();
    assert_eq!(output.take_sent(), notes_off());
}

#[test]
fn test_live_notes_echo_and_record() {
    let (mut seq, output) = sequencer();
    seq.apply(Command::Arm(true)).unwrap();
    seq.apply(Command::Start).unwrap();
    output.take_sent();

    seq.live_note_on(64, 90, 0);
    assert_eq!(
        output.take_sent(),
        vec![MidiMessage::NoteOn {
            channel: CH,
            note: 64,
            velocity: 90
        }]
    );
    assert!(seq.record().pending(64).is_some());

    let recorded = seq.live_note_off(64, 0);
    assert_eq!(recorded, Some(Note::new(0, 1, 64, 90)));
    assert_eq!(seq.pattern().track.len(), 1);
}

#[test]
fn test_test_note_releases_after_delay() {
    let (mut seq, output) = sequencer();
    seq.send_test_note(1_000);
    assert_eq!(output.sent().len(), 1);
    assert_eq!(seq.dispatcher().pending(), 1);

    seq.update(200_999);
    assert_eq!(output.sent().len(), 1);
    seq.update(201_000);
    assert_eq!(
        output.sent().last(),
        Some(&MidiMessage::NoteOff {
            channel: CH,
            note: 60,
            velocity: 0
        })
    );
}

#[test]
fn test_status_snapshot() {
    let (mut seq, _) = sequencer();
    seq.apply(Command::Arm(true)).unwrap();
    seq.apply(Command::Start).unwrap();
    seq.apply(Command::Locate(100)).unwrap();

    let status = seq.status(3);
    assert_eq!(status.play_tick, 100);
    assert_eq!(status.loop_length, 384);
    assert_eq!(status.dropped_ticks, 3);
    assert!(status.armed);
    assert!(status.is_running());
}

#[test]
fn test_step_count_change_while_recording() {
    let (mut seq, _) = sequencer();
    seq.apply(Command::Arm(true)).unwrap();
    seq.apply(Command::Start).unwrap();
    seq.apply(Command::Locate(300)).unwrap();

    seq.live_note_on(60, 100, 0);
    seq.apply(Command::SetStepCount(4)).unwrap();
    assert_eq!(seq.transport().play_tick(), 12);

    let recorded = seq.live_note_off(60, 0);
    assert_eq!(recorded, Some(Note::new(24, 1, 60, 100)));
}
