use std::sync::atomic::{AtomicU64, Ordering};

use shared::protocol::GameUpdate;
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use crate::game::{GameAuthority, PullOutcome, RateLimiter};

pub(crate) struct AppState {
    pub(crate) game: GameAuthority,
    pub(crate) limiter: Mutex<RateLimiter>,
    pub(crate) events: broadcast::Sender<GameUpdate>,
    pub(crate) active_users: AtomicU64,
}

impl AppState {
    pub(crate) fn new(game: GameAuthority, limiter: RateLimiter) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            game,
            limiter: Mutex::new(limiter),
            events,
            active_users: AtomicU64::new(0),
        }
    }

    pub(crate) fn active_users(&self) -> u64 {
        self.active_users.load(Ordering::SeqCst)
    }

    pub(crate) async fn current_update(&self) -> anyhow::Result<GameUpdate> {
        let counters = self.game.snapshot().await?;
        Ok(GameUpdate::from_counters(
            &counters,
            Some(self.active_users()),
        ))
    }

    /// Broadcasts the state(s) produced by a pull. A finished round is sent
    /// as the terminal state followed by the fresh one.
    pub(crate) fn publish(&self, outcome: &PullOutcome) {
        let users = Some(self.active_users());
        match outcome {
            PullOutcome::Moved(counters) => {
                let _ = self.events.send(GameUpdate::from_counters(counters, users));
            }
            PullOutcome::Won {
                finished,
                result,
                next,
            } => {
                let _ = self.events.send(GameUpdate::from_counters(finished, users));
                info!(
                    round = result.round,
                    winner = %result.winner,
                    left_pulls = result.left_pulls,
                    right_pulls = result.right_pulls,
                    "round finished"
                );
                let _ = self.events.send(GameUpdate::from_counters(next, users));
            }
        }
    }
}
