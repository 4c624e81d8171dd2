//! Deterministic bring-up pattern.

use crate::model::{Note, Pattern};
use log::info;

const SEED: u32 = 0x00C0_FFEE;

/// Linear congruential generator (Numerical Recipes constants).
#[derive(Debug, Clone)]
pub struct Lcg(u32);

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Lcg(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0
    }

    /// Uniform-ish value in `0..bound`.
    pub fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound.max(1)
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Lcg::new(SEED)
    }
}

/// Replaces the track with sparse notes: one to three per occupied step, one
/// to two steps long, pitches 24..127, slightly late against the grid.
pub fn fill_demo_pattern(pattern: &mut Pattern, rng: &mut Lcg) {
    pattern.track.clear();
    let step = pattern.step_ticks();
    let mut s: u32 = 0;

    while s < u32::from(pattern.step_count()) {
        let repeats = 1 + rng.below(3);
        for _ in 0..repeats {
            let pitch = (24 + rng.below(104)) as u8;
            let on = s * step + rng.below((step / 2).max(1));
            let duration = step * (1 + rng.below(2));
            let velocity = (60 + rng.below(68)) as u8;
            pattern.track.insert(Note::new(on, duration, pitch, velocity));
        }
        s += 1 + rng.below(4);
    }

    info!(
        "Demo pattern generated: {} notes over {} steps",
        pattern.track.len(),
        pattern.step_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_pattern_is_deterministic_and_in_range() {
        let mut a = Pattern::new(64, 16, 120.0);
        let mut b = Pattern::new(64, 16, 120.0);
        fill_demo_pattern(&mut a, &mut Lcg::default());
        fill_demo_pattern(&mut b, &mut Lcg::default());
        assert_eq!(a, b);
        assert!(!a.track.is_empty());

        for note in a.track.notes() {
            assert!(note.pitch >= 24 && note.pitch <= 127);
            assert!(note.velocity >= 60 && note.velocity <= 127);
            assert!(note.on_tick < a.ticks());
        }
        let starts: Vec<u32> = a.track.notes().iter().map(|n| n.on_tick).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }
}
