use std::{cmp::Reverse, time::Duration};

use keyed_priority_queue::KeyedPriorityQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// The sender's retransmission timer. At most one firing is pending.
    Timer,
    /// The next message from the application.
    Produce,
    /// A packet in flight, keyed by its transmission id.
    Delivery(u64),
}

/// Future events ordered by virtual time, then by scheduling order.
pub struct EventQue {
    queue: KeyedPriorityQueue<EventKey, Reverse<(Duration, u64)>>,
    next_order: u64,
}

impl EventQue {
    #[must_use]
    pub fn new() -> Self {
        EventQue {
            queue: KeyedPriorityQueue::new(),
            next_order: 0,
        }
    }

    /// Schedules `key` at `at`, replacing any pending event with the same key.
    pub fn schedule(&mut self, key: EventKey, at: Duration) {
        let order = self.next_order;
        self.next_order += 1;
        self.queue.push(key, Reverse((at, order)));
    }

    /// Returns `true` if an event was pending.
    pub fn cancel(&mut self, key: &EventKey) -> bool {
        self.queue.remove(key).is_some()
    }

    /// Removes the earliest event.
    pub fn pop(&mut self) -> Option<(EventKey, Duration)> {
        self.queue.pop().map(|(key, Reverse((at, _order)))| (key, at))
    }

    #[must_use]
    pub fn contains(&self, key: &EventKey) -> bool {
        self.queue.get_priority(key).is_some()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl Default for EventQue {
    fn default() -> Self {
        Self::new()
    }
}
