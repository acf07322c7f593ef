//! Client-side projector: folds server updates into a render model.

use std::time::Instant;

use chrono::Utc;
use shared::{
    domain::Side,
    protocol::{ClientAction, GameUpdate},
};
use tracing::{debug, info};

use crate::{
    animation::{PulseAnimation, PulseFrame},
    clock::{Clock, SystemClock},
    message_log::{MessageLog, DEFAULT_LOG_CAPACITY},
    types::{GameState, ViewEvent},
    view::ViewFrame,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewUpdate {
    pub frame: ViewFrame,
    pub events: Vec<ViewEvent>,
}

pub struct ViewController<C: Clock = SystemClock> {
    clock: C,
    state: GameState,
    frame: ViewFrame,
    pulse: PulseAnimation,
    log: MessageLog,
}

impl Default for ViewController<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock, DEFAULT_LOG_CAPACITY)
    }
}

impl<C: Clock> ViewController<C> {
    pub fn new(clock: C, log_capacity: usize) -> Self {
        Self {
            clock,
            state: GameState::default(),
            frame: ViewFrame::default(),
            pulse: PulseAnimation::new(),
            log: MessageLog::with_capacity(log_capacity),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn frame(&self) -> &ViewFrame {
        &self.frame
    }

    pub fn pulse(&self) -> PulseFrame {
        self.pulse.frame()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn apply_update(&mut self, update: GameUpdate) -> ViewUpdate {
        let now = self.clock.now();
        let pulled = self.state.attribute_pull(&update);
        self.state = GameState::from(update);

        let frame = ViewFrame::project(&self.state);
        self.pulse.trigger(frame.flag_percent, now);

        let mut events = Vec::new();
        if let Some(side) = pulled {
            let entry = self.log.push(side, frame.score, now, Utc::now());
            debug!(side = %side, score = frame.score, "pull attributed");
            events.push(ViewEvent::PullLogged(entry));
        }

        if let Some(winner) = Side::winner(self.state.position) {
            info!(%winner, position = self.state.position, "round won");
            events.push(ViewEvent::RoundWon {
                winner,
                notice: format!("{winner} Wins!"),
            });
            self.state.reset_round();
        }

        self.frame = frame.clone();
        ViewUpdate { frame, events }
    }

    /// Outbound message for a pull from `side`.
    pub fn pull_request(side: Side) -> ClientAction {
        ClientAction::pull(side)
    }

    /// Advances timers. Returns whether anything visible changed.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        let pulse_changed = self.pulse.advance(now);
        let log_changed = self.log.advance(now);
        pulse_changed || log_changed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.pulse.next_deadline(), self.log.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn reset(&mut self) {
        self.state = GameState::default();
        self.frame = ViewFrame::default();
        self.pulse.cancel();
        self.log.clear();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
