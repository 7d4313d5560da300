//! Deferred interrupt-endpoint repoll queue.
//!
//! Interrupt transactions that NAK release their channel immediately and are
//! rearmed `bInterval` milliseconds later (§4.1, §9 "Timer-based interrupt
//! polling"). Rather than holding a channel while waiting, pending repolls
//! sit here keyed by the tick at which they become due; [`DeferredQueue::pop_due`]
//! is drained once per call to [`crate::hcd::Hcd::on_timer_tick`].

use alloc::vec::Vec;

/// One pending interrupt-endpoint repoll.
#[derive(Debug, Clone, Copy)]
pub struct Deferred<T> {
    due_tick: u64,
    item: T,
}

/// An unordered bag of deferred repolls, drained by due tick.
///
/// A small linear-scan structure is adequate here: the channel pool bounds
/// concurrent interrupt endpoints to a handful (≥8 channels total), so a
/// binary heap would only add code for no measurable benefit.
pub struct DeferredQueue<T> {
    pending: Vec<Deferred<T>>,
}

impl<T: Copy> DeferredQueue<T> {
    /// Creates an empty queue.
    pub const fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Schedules `item` to become due at `due_tick`.
    pub fn push(&mut self, due_tick: u64, item: T) {
        self.pending.push(Deferred { due_tick, item });
    }

    /// Removes and returns every item whose `due_tick <= now`.
    pub fn pop_due(&mut self, now: u64) -> Vec<T> {
        let mut due = Vec::new();
        self.pending.retain(|d| {
            if d.due_tick <= now {
                due.push(d.item);
                false
            } else {
                true
            }
        });
        due
    }

    /// Number of repolls still pending.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if no repolls are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T: Copy> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_due_only_returns_expired_items() {
        let mut q: DeferredQueue<u32> = DeferredQueue::new();
        q.push(100, 1);
        q.push(200, 2);
        q.push(150, 3);

        let due = q.pop_due(150);
        assert_eq!(due.len(), 2);
        assert!(due.contains(&1));
        assert!(due.contains(&3));
        assert_eq!(q.len(), 1);

        let due2 = q.pop_due(200);
        assert_eq!(due2, alloc::vec![2]);
        assert!(q.is_empty());
    }
}
