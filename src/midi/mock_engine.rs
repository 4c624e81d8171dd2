use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use std::sync::{Arc, Mutex};

/// Records every sent message. Clones share the same log, so a test can keep
/// one handle after moving the engine into a dispatcher.
#[derive(Debug, Clone, Default)]
pub struct MockMidiEngine {
    sent: Arc<Mutex<Vec<MidiMessage>>>,
    disconnected: bool,
}

impl MockMidiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose sends always fail.
    pub fn disconnected() -> Self {
        MockMidiEngine {
            disconnected: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<MidiMessage> {
        self.sent.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn take_sent(&self) -> Vec<MidiMessage> {
        self.sent
            .lock()
            .map(|mut log| std::mem::take(&mut *log))
            .unwrap_or_default()
    }
}

impl MidiEngine for MockMidiEngine {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        if self.disconnected {
            return Err(MidiError::NotConnected);
        }
        self.sent
            .lock()
            .map_err(|e| MidiError::SendError(e.to_string()))?
            .push(msg);
        Ok(())
    }
}
