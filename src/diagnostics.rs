//! Read-only views for display and monitoring collaborators.

use crate::transport::{SongPosition, TransportState};
use chrono::{DateTime, Local};
use log::info;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub play_tick: u32,
    pub position: SongPosition,
    pub loop_length: u32,
    pub tempo: f32,
    pub state: TransportState,
    pub armed: bool,
    pub dropped_ticks: u32,
    pub dropped_events: u32,
    pub taken_at: DateTime<Local>,
}

impl StatusSnapshot {
    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TransportState::Paused
    }

    /// One-line summary for status displays.
    pub fn summary(&self) -> String {
        format!(
            "{} | {:>5.1} BPM | tick {:>5}/{} | {:?}{} | dropped {}",
            self.position,
            self.tempo,
            self.play_tick,
            self.loop_length,
            self.state,
            if self.armed { " REC" } else { "" },
            self.dropped_ticks
        )
    }
}

/// Percentiles of tick timing error, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterReport {
    pub p50: u32,
    pub p95: u32,
    pub max: u32,
    pub samples: usize,
}

/// Collects the absolute deviation between consecutive tick timestamps and the
/// nominal period, reporting once per full window.
#[derive(Debug)]
pub struct JitterStats {
    period_micros: u32,
    window: usize,
    last_timestamp: Option<u32>,
    errors: Vec<u32>,
}

pub const JITTER_WINDOW: usize = 1000;

impl JitterStats {
    pub fn new(period_micros: u32) -> Self {
        Self::with_window(period_micros, JITTER_WINDOW)
    }

    pub fn with_window(period_micros: u32, window: usize) -> Self {
        JitterStats {
            period_micros,
            window: window.max(1),
            last_timestamp: None,
            errors: Vec::with_capacity(window.max(1)),
        }
    }

    /// Records one tick timestamp. Returns a report when the window fills.
    pub fn record(&mut self, timestamp: u32) -> Option<JitterReport> {
        if let Some(last) = self.last_timestamp.replace(timestamp) {
            let interval = timestamp.wrapping_sub(last);
            self.errors.push(interval.abs_diff(self.period_micros));
        }
        if self.errors.len() < self.window {
            return None;
        }

        self.errors.sort_unstable();
        let n = self.errors.len();
        let report = JitterReport {
            p50: self.errors[n / 2],
            p95: self.errors[(n * 95 / 100).min(n - 1)],
            max: self.errors[n - 1],
            samples: n,
        };
        self.errors.clear();
        self.last_timestamp = None;
        Some(report)
    }

    /// Forget the previous timestamp, e.g. after the timer was re-armed.
    pub fn reset(&mut self) {
        self.errors.clear();
        self.last_timestamp = None;
    }
}

pub fn log_jitter(report: &JitterReport, dropped: u32) {
    info!(
        "Tick jitter abs-error (µs): p50={} p95={} max={} over {} ticks, dropped={}",
        report.p50, report.p95, report.max, report.samples, dropped
    );
}
