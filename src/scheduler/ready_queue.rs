/*
 * Ready Queue
 *
 * This module implements the ordered ready queue shared by all policies.
 *
 * Design:
 * - Intrusive doubly-linked list over a link arena indexed by ProcessHandle
 * - Slot 0 is a sentinel; the list is circular through it, so head, tail
 *   and empty checks need no special cases
 * - O(1) unlink for dequeue and remove, O(n) ordered insert
 *
 * The ordering key is captured at insertion time. A queued record is never
 * running, so its remaining time (the SRTN key) cannot change while queued.
 */

use super::{process::ProcessHandle, types::OrderingKey};

const SENTINEL: usize = 0;

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
    key: OrderingKey,
    queued: bool,
}

impl Link {
    const fn detached() -> Self {
        Self {
            prev: SENTINEL,
            next: SENTINEL,
            key: OrderingKey::Fifo,
            queued: false,
        }
    }
}

/// Ordered queue of ready processes
#[derive(Debug)]
pub struct ReadyQueue {
    links: Vec<Link>,
    len: usize,
}

impl ReadyQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty queue with room for `capacity` handles
    pub fn with_capacity(capacity: usize) -> Self {
        let mut links = Vec::with_capacity(capacity + 1);
        links.push(Link::detached());
        Self { links, len: 0 }
    }

    fn slot(handle: ProcessHandle) -> usize {
        handle.0 + 1
    }

    fn handle(slot: usize) -> ProcessHandle {
        ProcessHandle(slot - 1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, handle: ProcessHandle) -> bool {
        self.links
            .get(Self::slot(handle))
            .is_some_and(|link| link.queued)
    }

    /// Insert `handle` at the position given by `key`
    ///
    /// Ranked keys go in front of the first record with a strictly greater
    /// key (tail if none). Fifo keys always go to the tail.
    ///
    /// # Panics
    /// If `handle` is already queued.
    pub fn enqueue(&mut self, handle: ProcessHandle, key: OrderingKey) {
        let slot = Self::slot(handle);
        if slot >= self.links.len() {
            self.links.resize(slot + 1, Link::detached());
        }
        assert!(!self.links[slot].queued, "ready queue: process slot {} enqueued twice", handle.0);

        let mut before = SENTINEL;
        if matches!(key, OrderingKey::Ranked(_)) {
            let mut cursor = self.links[SENTINEL].next;
            while cursor != SENTINEL {
                if key.precedes(self.links[cursor].key) {
                    before = cursor;
                    break;
                }
                cursor = self.links[cursor].next;
            }
        }

        let prev = self.links[before].prev;
        self.links[slot] = Link {
            prev,
            next: before,
            key,
            queued: true,
        };
        self.links[prev].next = slot;
        self.links[before].prev = slot;
        self.len += 1;
    }

    /// Head of the queue without removing it
    pub fn peek_head(&self) -> Option<ProcessHandle> {
        match self.links[SENTINEL].next {
            SENTINEL => None,
            slot => Some(Self::handle(slot)),
        }
    }

    /// Remove and return the head
    pub fn dequeue_head(&mut self) -> Option<ProcessHandle> {
        let head = self.peek_head()?;
        self.remove(head);
        Some(head)
    }

    /// Unlink `handle` from anywhere in the queue
    ///
    /// # Panics
    /// If `handle` is not queued.
    pub fn remove(&mut self, handle: ProcessHandle) {
        assert!(self.contains(handle), "ready queue: process slot {} is not queued", handle.0);

        let slot = Self::slot(handle);
        let Link { prev, next, .. } = self.links[slot];
        self.links[prev].next = next;
        self.links[next].prev = prev;
        self.links[slot] = Link::detached();
        self.len -= 1;
    }

    /// Iterate from head to tail
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            queue: self,
            cursor: self.links[SENTINEL].next,
        }
    }

    /// Iterate from head to tail, yielding the key captured at insertion
    pub fn iter_keyed(&self) -> impl Iterator<Item = (ProcessHandle, OrderingKey)> + '_ {
        self.iter()
            .map(|handle| (handle, self.links[Self::slot(handle)].key))
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Head-to-tail iterator over queued handles
pub struct Iter<'a> {
    queue: &'a ReadyQueue,
    cursor: usize,
}

impl Iterator for Iter<'_> {
    type Item = ProcessHandle;

    fn next(&mut self) -> Option<ProcessHandle> {
        if self.cursor == SENTINEL {
            return None;
        }
        let slot = self.cursor;
        self.cursor = self.queue.links[slot].next;
        Some(ReadyQueue::handle(slot))
    }
}
