use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distance from the centre at which a round is decided.
pub const TOTAL_STEPS: i64 = 10_000_000;

/// Half-width of the zoomed inset window around the centre.
pub const INSET_HALF_WINDOW: i64 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side currently ahead; a flag resting on the centre counts for the right.
    pub fn leading(position: i64) -> Self {
        if position >= 0 {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Winner of a round that ended at `position`, if it ended at all.
    pub fn winner(position: i64) -> Option<Self> {
        if position >= TOTAL_STEPS {
            Some(Side::Right)
        } else if position <= -TOTAL_STEPS {
            Some(Side::Left)
        } else {
            None
        }
    }

    /// Signed flag displacement caused by one pull from this side.
    pub fn step(self) -> i64 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "Left",
            Side::Right => "Right",
        })
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" => Ok(Side::Left),
            "r" | "right" => Ok(Side::Right),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundCounters {
    pub round: i64,
    pub position: i64,
    pub left_pulls: u64,
    pub right_pulls: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: i64,
    pub winner: Side,
    pub left_pulls: u64,
    pub right_pulls: u64,
    pub finished_at: DateTime<Utc>,
}
