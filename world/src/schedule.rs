//! Timed events keyed by simulated due time.

use std::{cmp::Reverse, collections::BinaryHeap, time::Duration};

use portal_defence_core::EnemyKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScheduledAction {
    Spawn { wave: u32, kind: EnemyKind },
    StartWave,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    due: Duration,
    sequence: u64,
    action: ScheduledAction,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.sequence) == (other.due, other.sequence)
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.sequence).cmp(&(other.due, other.sequence))
    }
}

/// Priority queue of pending actions; equal due times fire in insertion order.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_sequence: u64,
}

impl Scheduler {
    pub(crate) fn schedule(&mut self, due: Duration, action: ScheduledAction) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.queue.push(Reverse(Entry {
            due,
            sequence,
            action,
        }));
    }

    /// Removes and returns the earliest action due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<ScheduledAction> {
        let Reverse(entry) = self.queue.peek()?;
        if entry.due > now {
            return None;
        }
        self.queue.pop().map(|Reverse(entry)| entry.action)
    }

    /// Drops every pending automatic wave start.
    pub(crate) fn cancel_wave_start(&mut self) {
        self.queue
            .retain(|Reverse(entry)| entry.action != ScheduledAction::StartWave);
    }

    /// Due time of the pending automatic wave start, if any.
    pub(crate) fn wave_start_due(&self) -> Option<Duration> {
        self.queue
            .iter()
            .filter(|Reverse(entry)| entry.action == ScheduledAction::StartWave)
            .map(|Reverse(entry)| entry.due)
            .min()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}
