//! Cooperative timers
//!
//! Delayed actions keyed by simulated time. The loop drains whatever is due
//! at the start of each tick; nothing sleeps or runs on another thread.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Deferred work the loop performs when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedAction {
    /// Purge an exploded obstacle
    RemoveObstacle(u32),
    /// Tell the host to leave the play screen
    EndSession,
}

#[derive(Debug)]
struct Entry {
    fire_at: f64,
    /// Insertion order, breaks ties between equal deadlines
    seq: u64,
    action: TimedAction,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed so the max-heap pops the earliest deadline first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .total_cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of pending timers
#[derive(Debug, Default)]
pub struct Timers {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once simulated time reaches `fire_at`
    pub fn schedule(&mut self, fire_at: f64, action: TimedAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            fire_at,
            seq,
            action,
        });
    }

    /// Drop every pending timer; returns how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let count = self.heap.len();
        self.heap.clear();
        count
    }

    /// Pop every action due at `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> Vec<TimedAction> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|e| e.fire_at <= now) {
            let Some(entry) = self.heap.pop() else {
                break;
            };
            due.push(entry.action);
        }
        due
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
