//! # Recyclable Handle Pool
//!
//! Grow-only pool of object slots addressed by stable handles. Releasing a
//! handle parks the slot on an idle queue instead of dropping the object;
//! acquiring pops an idle slot if one exists and only mints a new slot when
//! none are idle. The pool never shrinks.
//!
//! This is the allocation discipline behind pooled visual objects (clouds):
//! the simulation deactivates and reactivates them constantly, and reusing a
//! parked slot is a repositioning, not a reallocation.
//!
//! # Thread Safety
//!
//! The pool is NOT thread-safe. It is owned by the main loop, which is the
//! only place activation/deactivation requests are drained.

use std::collections::VecDeque;

/// Handle to a slot in a [`HandlePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(usize);

impl Handle {
    /// Raw slot index, for read-only snapshot export.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A grow-only pool of recyclable object slots.
#[derive(Debug)]
pub struct HandlePool<T> {
    /// Every slot ever minted. Slots are never removed.
    slots: Vec<T>,
    /// Indices of slots that are currently parked.
    idle: VecDeque<usize>,
}

impl<T> HandlePool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            idle: VecDeque::new(),
        }
    }

    /// Total number of slots ever minted.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool has minted no slots yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of parked slots available for reuse.
    #[inline]
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Number of live (non-parked) slots.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.idle.len()
    }

    /// Acquires a slot, reusing an idle one when available.
    ///
    /// `create` is only called when no idle slot exists.
    pub fn acquire_with(&mut self, create: impl FnOnce() -> T) -> Handle {
        if let Some(index) = self.idle.pop_front() {
            return Handle(index);
        }

        let index = self.slots.len();
        self.slots.push(create());
        Handle(index)
    }

    /// Parks a slot for later reuse. The object stays allocated.
    ///
    /// Returns `false` for handles that do not belong to this pool.
    pub fn release(&mut self, handle: Handle) -> bool {
        if handle.0 >= self.slots.len() || self.idle.contains(&handle.0) {
            return false;
        }
        self.idle.push_back(handle.0);
        true
    }

    /// Gets a reference to a slot.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0)
    }

    /// Gets a mutable reference to a slot.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)
    }

    /// Iterates over every slot ever minted, live or parked.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().map(|(i, v)| (Handle(i), v))
    }
}

impl<T> Default for HandlePool<T> {
    fn default() -> Self {
        Self::new()
    }
}
