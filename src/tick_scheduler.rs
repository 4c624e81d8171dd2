//! Interrupt-driven tick source.
//!
//! Each timer interrupt stamps a [`Tick`] and pushes it into the hand-off
//! buffer without blocking. A full buffer drops the tick and bumps a counter.

use crate::clock::{IntervalTimer, MicrosSource, TimerError};
use crate::config::RING_BUFFER_CAPACITY;
use crate::ring_buffer::{ring_buffer, Consumer};
use log::{info, warn};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    pub sequence: u32,
    pub timestamp: u32,
}

pub struct TickScheduler<T: IntervalTimer> {
    timer: T,
    consumer: Option<Consumer<Tick, RING_BUFFER_CAPACITY>>,
    dropped: Arc<AtomicU32>,
}

impl<T: IntervalTimer> TickScheduler<T> {
    pub fn new(timer: T) -> Self {
        TickScheduler {
            timer,
            consumer: None,
            dropped: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Arms the timer with a fresh buffer, sequence counter and drop counter.
    ///
    /// The ISR closure owns the producer half; `end()` drops it with the timer
    /// registration, so nothing outlives the scheduler's arming.
    pub fn begin<C>(&mut self, period_micros: u32, clock: C) -> Result<(), TimerError>
    where
        C: MicrosSource + Send + 'static,
    {
        if self.timer.is_armed() {
            return Err(TimerError::AlreadyArmed);
        }

        let (mut producer, consumer) = ring_buffer::<Tick, RING_BUFFER_CAPACITY>();
        let dropped = Arc::new(AtomicU32::new(0));
        let isr_dropped = Arc::clone(&dropped);
        let mut sequence: u32 = 0;

        let isr = Box::new(move || {
            let tick = Tick {
                sequence,
                timestamp: clock.now_micros(),
            };
            sequence = sequence.wrapping_add(1);
            if producer.push(tick).is_err() {
                isr_dropped.fetch_add(1, Ordering::Relaxed);
            }
        });

        if let Err(e) = self.timer.begin(period_micros, isr) {
            warn!("Tick scheduler failed to arm: {}", e);
            return Err(e);
        }

        self.consumer = Some(consumer);
        self.dropped = dropped;
        info!("Tick scheduler armed at {} µs", period_micros);
        Ok(())
    }

    /// Disarms the timer. Ticks already queued stay fetchable.
    pub fn end(&mut self) {
        if self.timer.is_armed() {
            self.timer.end();
            info!(
                "Tick scheduler disarmed, {} ticks dropped",
                self.dropped()
            );
        }
    }

    /// Pops the oldest pending tick.
    pub fn fetch(&mut self) -> Option<Tick> {
        self.consumer.as_mut().and_then(|c| c.pop())
    }

    /// Ticks discarded because the buffer was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Ticks waiting to be fetched.
    pub fn depth(&self) -> usize {
        self.consumer.as_ref().map_or(0, |c| c.len())
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

impl<T: IntervalTimer> Drop for TickScheduler<T> {
    fn drop(&mut self) {
        self.end();
    }
}
