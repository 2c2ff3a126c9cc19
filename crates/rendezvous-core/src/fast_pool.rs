//! Fixed-capacity, drop-oldest ring buffer.
//!
//! `push` never blocks and never grows: on a full pool the oldest element is
//! evicted first. Length is derived in O(1) from the two cursors plus a flag
//! recording whether the push cursor is one lap ahead of the pop cursor,
//! which tells "equal because empty" apart from "equal because full".

pub struct FastPool<T> {
    slots: Box<[Option<T>]>,
    push_index: usize,
    pop_index: usize,
    lapped: bool,
}

impl<T> FastPool<T> {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FastPool capacity must be non-zero");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            push_index: 0,
            pop_index: 0,
            lapped: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        if self.lapped {
            self.capacity() - (self.pop_index - self.push_index)
        } else {
            self.push_index - self.pop_index
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.lapped && self.push_index == self.pop_index
    }

    pub fn is_full(&self) -> bool {
        self.lapped && self.push_index == self.pop_index
    }

    /// Append `value`, evicting and returning the oldest element if full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() { self.pop() } else { None };
        self.slots[self.push_index] = Some(value);
        self.push_index += 1;
        if self.push_index == self.capacity() {
            self.push_index = 0;
            self.lapped = true;
        }
        evicted
    }

    /// Remove the oldest element. No-op on an empty pool.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.pop_index].take();
        self.pop_index += 1;
        if self.pop_index == self.capacity() {
            self.pop_index = 0;
            self.lapped = false;
        }
        value
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.pop_index].as_ref()
    }

    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let last = (self.push_index + self.capacity() - 1) % self.capacity();
        self.slots[last].as_ref()
    }

    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let cap = self.capacity();
        (0..self.len()).filter_map(move |i| self.slots[(self.pop_index + i) % cap].as_ref())
    }
}

impl<T> std::fmt::Debug for FastPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastPool")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
