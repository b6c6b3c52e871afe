//! Bounded FIFO of vehicles for one lane
//!
//! A fixed-capacity ring buffer. A full queue refuses new entries, which
//! is how admission backpressure works: the request is dropped and the
//! caller counts it.

/// Fixed-capacity circular queue
#[derive(Debug, Clone)]
pub struct LaneQueue<T> {
    slots: Vec<Option<T>>,
    front: usize,
    count: usize,
}

impl<T> LaneQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            front: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Append to the back. Returns false (and drops `item`) when full.
    pub fn enqueue(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        let rear = (self.front + self.count) % self.capacity();
        self.slots[rear] = Some(item);
        self.count += 1;
        true
    }

    /// Remove from the front
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.front].take();
        self.front = (self.front + 1) % self.capacity();
        self.count -= 1;
        item
    }

    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.front].as_ref()
    }

    /// Iterate front to back
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (head, tail) = self.split();
        self.slots[head]
            .iter()
            .chain(self.slots[tail].iter())
            .filter_map(Option::as_ref)
    }

    /// Iterate front to back, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        let (head, tail) = self.split();
        let (low, high) = self.slots.split_at_mut(head.start);
        // `head` always starts at `front`, `tail` (if any) starts at zero
        let tail_len = tail.len();
        high[..head.len()]
            .iter_mut()
            .chain(low[..tail_len].iter_mut())
            .filter_map(Option::as_mut)
    }

    /// Dequeue from the front while `done` holds, returning how many were removed
    pub fn reclaim_while(&mut self, mut done: impl FnMut(&T) -> bool) -> usize {
        let mut reclaimed = 0;
        while self.peek().is_some_and(&mut done) {
            self.dequeue();
            reclaimed += 1;
        }
        reclaimed
    }

    /// Drop every queued item, returning how many slots were released
    pub fn clear(&mut self) -> usize {
        let released = self.count;
        for slot in &mut self.slots {
            *slot = None;
        }
        self.front = 0;
        self.count = 0;
        released
    }

    /// Occupied index ranges: `front..` up to the buffer end, then the wrapped part
    fn split(&self) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let capacity = self.capacity();
        if capacity == 0 {
            return (0..0, 0..0);
        }
        let end = self.front + self.count;
        if end <= capacity {
            (self.front..end, 0..0)
        } else {
            (self.front..capacity, 0..end - capacity)
        }
    }
}
