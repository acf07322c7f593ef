//! Short-lived "X pulled!" notices, newest first.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use shared::domain::Side;

use crate::view::group_thousands;

pub const ENTRY_VISIBLE_FOR: Duration = Duration::from_millis(500);
pub const ENTRY_FADE_FOR: Duration = Duration::from_millis(500);
pub const DEFAULT_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPhase {
    Visible,
    Fading,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: u64,
    pub side: Side,
    pub score: u64,
    pub text: String,
    pub logged_at: DateTime<Utc>,
    pub phase: EntryPhase,
    created_at: Instant,
}

impl LogEntry {
    fn deadline(&self) -> Instant {
        match self.phase {
            EntryPhase::Visible => self.created_at + ENTRY_VISIBLE_FOR,
            EntryPhase::Fading => self.created_at + ENTRY_VISIBLE_FOR + ENTRY_FADE_FOR,
        }
    }
}

pub fn pull_notice(side: Side, score: u64) -> String {
    format!("{side} pulled! {} steps", group_thousands(score))
}

#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl MessageLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Prepends a pull notice, evicting the oldest entry when full.
    pub fn push(
        &mut self,
        side: Side,
        score: u64,
        now: Instant,
        logged_at: DateTime<Utc>,
    ) -> LogEntry {
        let entry = LogEntry {
            id: self.next_id,
            side,
            score,
            text: pull_notice(side, score),
            logged_at,
            phase: EntryPhase::Visible,
            created_at: now,
        };
        self.next_id += 1;

        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry.clone());
        entry
    }

    /// Fades entries past their display time and drops faded ones.
    pub fn advance(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for entry in self.entries.iter_mut() {
            if entry.phase == EntryPhase::Visible && now >= entry.deadline() {
                entry.phase = EntryPhase::Fading;
                changed = true;
            }
        }
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.phase == EntryPhase::Fading && now >= entry.deadline()));
        changed || self.entries.len() != before
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(LogEntry::deadline).min()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_comes_first() {
        let now = Instant::now();
        let mut log = MessageLog::default();
        log.push(Side::Left, 1, now, Utc::now());
        log.push(Side::Right, 2_500, now, Utc::now());

        let texts: Vec<&str> = log.entries().map(|entry| entry.text.as_str()).collect();
        assert_eq!(texts, vec!["Right pulled! 2,500 steps", "Left pulled! 1 steps"]);
    }

    #[test]
    fn entry_fades_then_disappears() {
        let now = Instant::now();
        let mut log = MessageLog::default();
        log.push(Side::Left, 3, now, Utc::now());
        assert_eq!(log.next_deadline(), Some(now + ENTRY_VISIBLE_FOR));

        assert!(!log.advance(now + Duration::from_millis(499)));
        assert!(log.advance(now + ENTRY_VISIBLE_FOR));
        assert_eq!(
            log.entries().next().map(|entry| entry.phase),
            Some(EntryPhase::Fading)
        );

        assert!(log.advance(now + ENTRY_VISIBLE_FOR + ENTRY_FADE_FOR));
        assert!(log.is_empty());
        assert_eq!(log.next_deadline(), None);
    }

    #[test]
    fn full_log_evicts_oldest() {
        let now = Instant::now();
        let mut log = MessageLog::with_capacity(2);
        let first = log.push(Side::Left, 1, now, Utc::now());
        log.push(Side::Left, 2, now, Utc::now());
        log.push(Side::Right, 3, now, Utc::now());

        assert_eq!(log.len(), 2);
        assert!(log.entries().all(|entry| entry.id != first.id));
    }

    #[test]
    fn zero_capacity_still_keeps_latest() {
        let mut log = MessageLog::with_capacity(0);
        log.push(Side::Right, 9, Instant::now(), Utc::now());
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
    }
}
