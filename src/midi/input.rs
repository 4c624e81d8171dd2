use crate::event_loop::EngineMessage;
use crate::midi::{MidiError, MidiMessage, Result};
use crossbeam::channel::Sender;
use log::{debug, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};

/// Live performance input. Note messages from the device are forwarded to the
/// engine channel; everything else is ignored.
pub struct LiveInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl LiveInput {
    pub fn connect(device_name: &str, tx: Sender<EngineMessage>) -> Result<Self> {
        let mut midi_in = MidiInput::new("tickseq-in")?;
        midi_in.ignore(Ignore::All);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| {
                MidiError::ConnectionError(format!("input device '{}' not found", device_name))
            })?;

        let port_name = midi_in.port_name(in_port)?;
        info!("Connecting to MIDI input port: {}", port_name);

        let connection = midi_in.connect(
            in_port,
            "tickseq-input",
            move |_stamp, data, _| {
                if let Some(message) = to_engine_message(data) {
                    debug!("Live input {:?}", message);
                    if tx.try_send(message).is_err() {
                        warn!("Engine channel full or closed, live note dropped");
                    }
                }
            },
            (),
        )?;

        Ok(LiveInput {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Maps raw input bytes to a live note message.
pub fn to_engine_message(data: &[u8]) -> Option<EngineMessage> {
    match MidiMessage::parse(data)? {
        MidiMessage::NoteOn { note, velocity, .. } => Some(EngineMessage::LiveNoteOn {
            pitch: note,
            velocity,
        }),
        MidiMessage::NoteOff { note, .. } => Some(EngineMessage::LiveNoteOff { pitch: note }),
        _ => None,
    }
}
