use shared::{domain::Side, protocol::GameUpdate};

use crate::message_log::LogEntry;

/// Last state seen from the server, as cached by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameState {
    pub position: i64,
    pub left_pulls: u64,
    pub right_pulls: u64,
    pub active_users: Option<u64>,
}

impl GameState {
    /// Which side pulled between `self` and `next`. Left wins ties.
    pub fn attribute_pull(&self, next: &GameUpdate) -> Option<Side> {
        if next.left_pulls > self.left_pulls {
            Some(Side::Left)
        } else if next.right_pulls > self.right_pulls {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Clears the round counters, keeping the player count.
    pub fn reset_round(&mut self) {
        self.position = 0;
        self.left_pulls = 0;
        self.right_pulls = 0;
    }
}

impl From<GameUpdate> for GameState {
    fn from(update: GameUpdate) -> Self {
        Self {
            position: update.position,
            left_pulls: update.left_pulls,
            right_pulls: update.right_pulls,
            active_users: update.active_users,
        }
    }
}

/// Notifications for the front-end to present however it likes.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    PullLogged(LogEntry),
    RoundWon { winner: Side, notice: String },
}
