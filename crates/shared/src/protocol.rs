use serde::{Deserialize, Serialize};

use crate::{
    domain::{RoundCounters, Side},
    error::ProtocolError,
};

/// State broadcast by the server after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameUpdate {
    pub position: i64,
    pub left_pulls: u64,
    pub right_pulls: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_users: Option<u64>,
}

impl GameUpdate {
    pub fn from_counters(counters: &RoundCounters, active_users: Option<u64>) -> Self {
        Self {
            position: counters.position,
            left_pulls: counters.left_pulls,
            right_pulls: counters.right_pulls,
            active_users,
        }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|err| ProtocolError::Malformed(err.to_string()))
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|err| ProtocolError::Encode(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    Pull { direction: Side },
}

impl ClientAction {
    pub fn pull(direction: Side) -> Self {
        ClientAction::Pull { direction }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|err| ProtocolError::Malformed(err.to_string()))
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|err| ProtocolError::Encode(err.to_string()))
    }
}
