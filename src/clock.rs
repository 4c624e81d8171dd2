// clock.rs

use log::{info, trace, warn};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Free-running microsecond counter, wrapping at `u32::MAX` like a
/// microcontroller's `micros()`.
pub trait MicrosSource {
    fn now_micros(&self) -> u32;
}

/// Microseconds elapsed since the source was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemMicros {
    origin: Instant,
}

impl SystemMicros {
    pub fn new() -> Self {
        SystemMicros {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemMicros {
    fn default() -> Self {
        Self::new()
    }
}

impl MicrosSource for SystemMicros {
    fn now_micros(&self) -> u32 {
        self.origin.elapsed().as_micros() as u32
    }
}

/// Hand-driven time source. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct ManualMicros {
    now: Arc<AtomicU32>,
}

impl ManualMicros {
    pub fn new(start: u32) -> Self {
        ManualMicros {
            now: Arc::new(AtomicU32::new(start)),
        }
    }

    pub fn set(&self, micros: u32) {
        self.now.store(micros, Ordering::SeqCst);
    }

    pub fn advance(&self, micros: u32) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.wrapping_add(micros))
            });
    }
}

impl MicrosSource for ManualMicros {
    fn now_micros(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Interrupt entry point registered with a timer.
pub type IsrCallback = Box<dyn FnMut() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// A zero period can never be armed
    InvalidPeriod,
    /// `begin` called twice without `end`
    AlreadyArmed,
    /// The platform refused to create the timer
    Unavailable(String),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::InvalidPeriod => write!(f, "timer period must be non-zero"),
            TimerError::AlreadyArmed => write!(f, "timer is already armed"),
            TimerError::Unavailable(msg) => write!(f, "timer unavailable: {}", msg),
        }
    }
}

impl Error for TimerError {}

/// A periodic hardware-style timer.
pub trait IntervalTimer {
    fn begin(&mut self, period_micros: u32, isr: IsrCallback) -> Result<(), TimerError>;
    fn end(&mut self);
    fn is_armed(&self) -> bool;
}

/// Periodic timer backed by a dedicated thread.
///
/// Deadlines are absolute (`start + n * period`), so oversleeping on one tick
/// shortens the next wait instead of accumulating drift.
pub struct ThreadTimer {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        ThreadTimer {
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalTimer for ThreadTimer {
    fn begin(&mut self, period_micros: u32, mut isr: IsrCallback) -> Result<(), TimerError> {
        if period_micros == 0 {
            return Err(TimerError::InvalidPeriod);
        }
        if self.thread_handle.is_some() {
            return Err(TimerError::AlreadyArmed);
        }

        info!("Arming thread timer with period {} µs", period_micros);
        let period = Duration::from_micros(u64::from(period_micros));
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name("tick-timer".into())
            .spawn(move || {
                let mut deadline = Instant::now() + period;
                while running.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    if deadline > now {
                        thread::sleep(deadline - now);
                    } else {
                        trace!("Timer late by {:?}", now - deadline);
                    }
                    isr();
                    deadline += period;
                }
                info!("Thread timer stopped");
            });

        match spawned {
            Ok(handle) => {
                self.thread_handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                warn!("Failed to spawn timer thread: {}", e);
                Err(TimerError::Unavailable(e.to_string()))
            }
        }
    }

    fn end(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    fn is_armed(&self) -> bool {
        self.thread_handle.is_some()
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.end();
    }
}

/// Timer fired by hand, for driving the tick path deterministically.
#[derive(Default)]
pub struct ManualTimer {
    isr: Option<IsrCallback>,
    period_micros: u32,
    refuse: bool,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timer that can never be armed.
    pub fn failing() -> Self {
        ManualTimer {
            refuse: true,
            ..Self::default()
        }
    }

    /// Runs the registered ISR once. Returns false when disarmed.
    pub fn fire(&mut self) -> bool {
        match self.isr.as_mut() {
            Some(isr) => {
                isr();
                true
            }
            None => false,
        }
    }

    pub fn period_micros(&self) -> u32 {
        self.period_micros
    }
}

impl IntervalTimer for ManualTimer {
    fn begin(&mut self, period_micros: u32, isr: IsrCallback) -> Result<(), TimerError> {
        if self.refuse {
            return Err(TimerError::Unavailable("manual timer set to fail".into()));
        }
        if period_micros == 0 {
            return Err(TimerError::InvalidPeriod);
        }
        if self.isr.is_some() {
            return Err(TimerError::AlreadyArmed);
        }
        self.period_micros = period_micros;
        self.isr = Some(isr);
        Ok(())
    }

    fn end(&mut self) {
        self.isr = None;
    }

    fn is_armed(&self) -> bool {
        self.isr.is_some()
    }
}
