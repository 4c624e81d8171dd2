use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "tickseq-out";
const CONNECTION_NAME: &str = "tickseq-output";

/// Output transport over a `midir` connection.
pub struct MidirEngine {
    output: MidiOutputConnection,
    port_name: String,
}

impl MidirEngine {
    /// Connects to the first output port whose name contains `device_name`,
    /// or to the first available port when no name is given.
    pub fn connect(device_name: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let out_ports = midi_out.ports();

        let port = match device_name {
            Some(name) => out_ports
                .iter()
                .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name))
                .ok_or_else(|| {
                    MidiError::ConnectionError(format!("output device '{}' not found", name))
                })?,
            None => out_ports.first().ok_or_else(|| {
                MidiError::ConnectionError("no MIDI output ports available".to_string())
            })?,
        };

        let port_name = midi_out.port_name(port)?;
        info!("Connecting to MIDI output port: {}", port_name);
        let output = midi_out.connect(port, CONNECTION_NAME)?;
        Ok(MidirEngine { output, port_name })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiEngine for MidirEngine {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        debug!("MIDI out {:?}", msg);
        self.output.send(&msg.to_bytes())?;
        Ok(())
    }
}

/// Names of all MIDI output ports.
#[cfg(not(feature = "test-mock"))]
pub fn list_output_devices() -> Vec<String> {
    match MidiOutput::new("tickseq-port-lister") {
        Ok(midi_out) => midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect(),
        Err(_) => vec![],
    }
}

#[cfg(feature = "test-mock")]
pub fn list_output_devices() -> Vec<String> {
    vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
}
