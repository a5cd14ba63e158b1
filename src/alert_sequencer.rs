use std::collections::VecDeque;

use crate::model::alert::AlertEvent;
use crate::model::signal::Signal;

pub const DEFAULT_ALERT_LOG_LEN: usize = 50;
pub const DEFAULT_ALERT_COOLDOWN_MS: u64 = 300_000;

/// Newest-first alert log with head-only deduplication.
///
/// A signal is suppressed when the current head is for the same symbol and
/// was recorded less than `cooldown_ms` ago, whatever its kind. Only the head
/// is consulted: an alert for another symbol in between lets the next signal
/// through.
#[derive(Debug)]
pub struct AlertSequencer {
    log: VecDeque<AlertEvent>,
    capacity: usize,
    cooldown_ms: u64,
}

impl Default for AlertSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_LOG_LEN, DEFAULT_ALERT_COOLDOWN_MS)
    }
}

impl AlertSequencer {
    pub fn new(capacity: usize, cooldown_ms: u64) -> Self {
        assert!(capacity > 0, "alert log capacity must be > 0");
        Self {
            log: VecDeque::with_capacity(capacity),
            capacity,
            cooldown_ms,
        }
    }

    pub fn is_suppressed(&self, symbol: &str, now_ms: u64) -> bool {
        match self.log.front() {
            Some(head) => {
                head.symbol == symbol
                    && now_ms.saturating_sub(head.timestamp_ms) < self.cooldown_ms
            }
            None => false,
        }
    }

    /// Returns the recorded alert, or `None` if the signal was suppressed.
    pub fn record(&mut self, signal: &Signal, now_ms: u64) -> Option<AlertEvent> {
        if self.is_suppressed(&signal.symbol, now_ms) {
            return None;
        }

        let alert = AlertEvent {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: signal.symbol.clone(),
            timestamp_ms: now_ms,
            price: signal.price,
            kind: signal.kind,
        };
        self.log.push_front(alert.clone());
        self.log.truncate(self.capacity);
        Some(alert)
    }

    /// Newest first.
    pub fn alerts(&self) -> impl Iterator<Item = &AlertEvent> {
        self.log.iter()
    }

    pub fn latest(&self) -> Option<&AlertEvent> {
        self.log.front()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
