// event_loop.rs

use crate::clock::{IntervalTimer, MicrosSource, TimerError};
use crate::commands::Command;
use crate::diagnostics::{log_jitter, JitterStats, StatusSnapshot};
use crate::midi::MidiEngine;
use crate::sequencer::Sequencer;
use crate::tick_scheduler::TickScheduler;
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use log::{debug, error, info};
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(250);

/// Messages from collaborator threads into the main context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineMessage {
    Command(Command),
    LiveNoteOn { pitch: u8, velocity: u8 },
    LiveNoteOff { pitch: u8 },
    TestNote,
    Shutdown,
}

/// Single-threaded run loop of the main context.
///
/// Each `service()` pass applies queued messages, drains every real-time tick
/// into the transport, drains every transport window through playback and
/// finally releases due events.
pub struct EventLoop<T, C, E>
where
    T: IntervalTimer,
    C: MicrosSource,
    E: MidiEngine,
{
    scheduler: TickScheduler<T>,
    clock: C,
    sequencer: Sequencer<E>,
    message_rx: Receiver<EngineMessage>,
    jitter: JitterStats,
    status_tx: Option<Sender<StatusSnapshot>>,
    status_interval_micros: u32,
    last_status_micros: u32,
    poll_interval: Duration,
    shutdown: bool,
}

impl<T, C, E> EventLoop<T, C, E>
where
    T: IntervalTimer,
    C: MicrosSource + Clone + Send + 'static,
    E: MidiEngine,
{
    pub fn new(
        scheduler: TickScheduler<T>,
        clock: C,
        sequencer: Sequencer<E>,
        message_rx: Receiver<EngineMessage>,
    ) -> Self {
        EventLoop {
            scheduler,
            clock,
            sequencer,
            message_rx,
            jitter: JitterStats::new(crate::config::TICK_MICROS),
            status_tx: None,
            status_interval_micros: 0,
            last_status_micros: 0,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown: false,
        }
    }

    /// Publishes a status snapshot at most every `interval`. Snapshots the
    /// display has not picked up yet are skipped, never waited on.
    pub fn with_status(mut self, status_tx: Sender<StatusSnapshot>, interval: Duration) -> Self {
        self.status_tx = Some(status_tx);
        self.status_interval_micros = interval.as_micros().min(u128::from(u32::MAX)) as u32;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Arms the tick source.
    pub fn start(&mut self, period_micros: u32) -> Result<(), TimerError> {
        self.jitter = JitterStats::new(period_micros);
        self.scheduler.begin(period_micros, self.clock.clone())
    }

    /// One service cycle. Returns false once shutdown was requested.
    pub fn service(&mut self) -> bool {
        loop {
            match self.message_rx.try_recv() {
                Ok(message) => self.handle_message(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("Engine channel closed, shutting down");
                    self.shutdown = true;
                    break;
                }
            }
        }

        while let Some(tick) = self.scheduler.fetch() {
            if let Some(report) = self.jitter.record(tick.timestamp) {
                log_jitter(&report, self.scheduler.dropped());
            }
            self.sequencer.on_realtime_tick();
        }

        let now = self.clock.now_micros();
        self.sequencer.process_windows(now);
        self.sequencer.update(now);
        self.publish_status(now);

        !self.shutdown
    }

    /// Services until shutdown, then disarms the timer and silences output.
    pub fn run(&mut self) {
        info!("Event loop running");
        while self.service() {
            match self.message_rx.recv_timeout(self.poll_interval) {
                Ok(message) => self.handle_message(message),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Engine channel closed, shutting down");
                    self.shutdown = true;
                }
            }
        }
        self.scheduler.end();
        let _ = self.sequencer.apply(Command::Stop);
        info!("Event loop stopped");
    }

    fn handle_message(&mut self, message: EngineMessage) {
        let now = self.clock.now_micros();
        match message {
            EngineMessage::Command(command) => {
                if let Err(e) = self.sequencer.apply(command) {
                    error!("Command failed: {}", e);
                }
            }
            EngineMessage::LiveNoteOn { pitch, velocity } => {
                self.sequencer.live_note_on(pitch, velocity, now)
            }
            EngineMessage::LiveNoteOff { pitch } => {
                if let Some(note) = self.sequencer.live_note_off(pitch, now) {
                    debug!("Captured {:?}", note);
                }
            }
            EngineMessage::TestNote => self.sequencer.send_test_note(now),
            EngineMessage::Shutdown => {
                info!("Shutdown requested");
                self.shutdown = true;
            }
        }
    }

    fn publish_status(&mut self, now: u32) {
        let Some(tx) = &self.status_tx else {
            return;
        };
        if now.wrapping_sub(self.last_status_micros) < self.status_interval_micros {
            return;
        }
        self.last_status_micros = now;
        match tx.try_send(self.sequencer.status(self.scheduler.dropped())) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                debug!("Status display gone, no longer publishing");
                self.status_tx = None;
            }
        }
    }

    pub fn sequencer(&self) -> &Sequencer<E> {
        &self.sequencer
    }

    pub fn scheduler(&self) -> &TickScheduler<T> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut TickScheduler<T> {
        &mut self.scheduler
    }
}
