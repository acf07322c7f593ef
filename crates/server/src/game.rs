use std::{
    collections::{HashMap, VecDeque},
    net::IpAddr,
    time::{Duration, Instant},
};

use anyhow::Result;
use shared::domain::{RoundCounters, RoundResult, Side};
use storage::Storage;
use tokio::sync::Mutex;

pub const RATE_WINDOW: Duration = Duration::from_secs(1);
const SWEEP_THRESHOLD: usize = 1024;

/// Sliding-window pull limiter keyed by client address.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    hits: HashMap<IpAddr, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            hits: HashMap::new(),
        }
    }

    pub fn allow(&mut self, ip: IpAddr, now: Instant) -> bool {
        if self.hits.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let window = self.window;
        let hits = self.hits.entry(ip).or_default();
        while hits
            .front()
            .is_some_and(|hit| now.saturating_duration_since(*hit) >= window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_per_window {
            return false;
        }
        hits.push_back(now);
        true
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }

    fn sweep(&mut self, now: Instant) {
        let window = self.window;
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|last| now.saturating_duration_since(*last) < window)
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullOutcome {
    Moved(RoundCounters),
    Won {
        finished: RoundCounters,
        result: RoundResult,
        next: RoundCounters,
    },
}

/// Owns pull resolution. Pulls go through one lock so every step is checked
/// against the bound before the next one lands.
pub struct GameAuthority {
    storage: Storage,
    resolve: Mutex<()>,
}

impl GameAuthority {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            resolve: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub async fn snapshot(&self) -> Result<RoundCounters> {
        self.storage.load_state().await
    }

    pub async fn pull(&self, side: Side) -> Result<PullOutcome> {
        let _guard = self.resolve.lock().await;
        let finished = self.storage.record_pull(side).await?;
        let Some(winner) = Side::winner(finished.position) else {
            return Ok(PullOutcome::Moved(finished));
        };
        let (result, next) = self.storage.finish_round(winner).await?;
        Ok(PullOutcome::Won {
            finished,
            result,
            next,
        })
    }
}

#[cfg(test)]
#[path = "tests/game_tests.rs"]
mod tests;
