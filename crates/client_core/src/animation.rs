//! Pulse drawn at the flag whenever a state update lands.

use std::time::{Duration, Instant};

pub const PULSE_EXPAND_AFTER: Duration = Duration::from_millis(10);
pub const PULSE_SETTLE_AFTER: Duration = Duration::from_millis(500);

const START_SIZE_PX: f64 = 20.0;
const EXPANDED_SIZE_PX: f64 = 100.0;
const VISIBLE_OPACITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulsePhase {
    Idle,
    Expanding,
    FadingOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseFrame {
    pub phase: PulsePhase,
    pub anchor_percent: f64,
    pub size_px: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub struct PulseAnimation {
    phase: PulsePhase,
    anchor_percent: f64,
    started_at: Option<Instant>,
}

impl Default for PulseAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseAnimation {
    pub fn new() -> Self {
        Self {
            phase: PulsePhase::Idle,
            anchor_percent: 50.0,
            started_at: None,
        }
    }

    pub fn phase(&self) -> PulsePhase {
        self.phase
    }

    /// Starts a pulse at `anchor_percent`. An in-flight pulse is dropped and
    /// the new one starts from the beginning.
    pub fn trigger(&mut self, anchor_percent: f64, now: Instant) {
        if self.phase != PulsePhase::Idle {
            tracing::trace!(phase = ?self.phase, "pulse preempted");
        }
        self.phase = PulsePhase::Expanding;
        self.anchor_percent = anchor_percent;
        self.started_at = Some(now);
    }

    pub fn cancel(&mut self) {
        self.phase = PulsePhase::Idle;
        self.started_at = None;
    }

    /// Moves through every phase whose deadline has passed. Returns whether
    /// the phase changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(started_at) = self.started_at else {
            return false;
        };
        let before = self.phase;
        let elapsed = now.saturating_duration_since(started_at);

        if elapsed >= PULSE_SETTLE_AFTER {
            self.cancel();
        } else if elapsed >= PULSE_EXPAND_AFTER {
            self.phase = PulsePhase::FadingOut;
        }

        self.phase != before
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let started_at = self.started_at?;
        match self.phase {
            PulsePhase::Idle => None,
            PulsePhase::Expanding => Some(started_at + PULSE_EXPAND_AFTER),
            PulsePhase::FadingOut => Some(started_at + PULSE_SETTLE_AFTER),
        }
    }

    pub fn frame(&self) -> PulseFrame {
        let (size_px, opacity) = match self.phase {
            PulsePhase::Idle => (0.0, VISIBLE_OPACITY),
            PulsePhase::Expanding => (START_SIZE_PX, VISIBLE_OPACITY),
            PulsePhase::FadingOut => (EXPANDED_SIZE_PX, 0.0),
        };
        PulseFrame {
            phase: self.phase,
            anchor_percent: self.anchor_percent,
            size_px,
            opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_expand_fade_idle_sequence() {
        let start = Instant::now();
        let mut pulse = PulseAnimation::new();
        pulse.trigger(42.0, start);
        assert_eq!(pulse.frame().size_px, 20.0);
        assert_eq!(pulse.next_deadline(), Some(start + PULSE_EXPAND_AFTER));

        assert!(!pulse.advance(start + Duration::from_millis(5)));
        assert!(pulse.advance(start + PULSE_EXPAND_AFTER));
        let frame = pulse.frame();
        assert_eq!(frame.phase, PulsePhase::FadingOut);
        assert_eq!(frame.size_px, 100.0);
        assert_eq!(frame.opacity, 0.0);
        assert_eq!(frame.anchor_percent, 42.0);

        assert!(pulse.advance(start + PULSE_SETTLE_AFTER));
        assert_eq!(pulse.phase(), PulsePhase::Idle);
        assert_eq!(pulse.frame().size_px, 0.0);
        assert_eq!(pulse.next_deadline(), None);
    }

    #[test]
    fn late_tick_skips_straight_to_idle() {
        let start = Instant::now();
        let mut pulse = PulseAnimation::new();
        pulse.trigger(50.0, start);
        assert!(pulse.advance(start + Duration::from_secs(2)));
        assert_eq!(pulse.phase(), PulsePhase::Idle);
    }

    #[test]
    fn retrigger_restarts_from_expanding() {
        let start = Instant::now();
        let mut pulse = PulseAnimation::new();
        pulse.trigger(10.0, start);
        pulse.advance(start + Duration::from_millis(100));
        assert_eq!(pulse.phase(), PulsePhase::FadingOut);

        let again = start + Duration::from_millis(200);
        pulse.trigger(90.0, again);
        assert_eq!(pulse.phase(), PulsePhase::Expanding);
        assert_eq!(pulse.frame().anchor_percent, 90.0);

        // The first pulse's settle deadline no longer applies.
        pulse.advance(start + PULSE_SETTLE_AFTER);
        assert_eq!(pulse.phase(), PulsePhase::FadingOut);
        assert_eq!(pulse.next_deadline(), Some(again + PULSE_SETTLE_AFTER));
    }
}
