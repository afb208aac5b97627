use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use docchat_core::traits::HistoryStore;
use docchat_core::types::Turn;

pub const DEFAULT_CAPACITY: usize = 10;

/// Per-namespace FIFO of the most recent turns; the oldest turn is evicted
/// once `capacity` is reached.
pub struct InMemoryHistory {
    capacity: usize,
    turns: Mutex<HashMap<String, VecDeque<Turn>>>,
}

impl Default for InMemoryHistory {
    fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self { Self { capacity: capacity.max(1), turns: Mutex::new(HashMap::new()) } }

    pub fn len(&self, namespace: &str) -> usize { self.turns.lock().get(namespace).map_or(0, VecDeque::len) }
}

impl HistoryStore for InMemoryHistory {
    fn append(&self, namespace: &str, turn: Turn) {
        let mut turns = self.turns.lock();
        let log = turns.entry(namespace.to_string()).or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if log.len() == self.capacity { log.pop_front(); }
        log.push_back(turn);
    }

    fn recent(&self, namespace: &str, max_turns: usize) -> Vec<Turn> {
        let turns = self.turns.lock();
        let Some(log) = turns.get(namespace) else { return vec![] };
        log.iter().skip(log.len().saturating_sub(max_turns)).cloned().collect()
    }
}
