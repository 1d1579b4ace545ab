//! Owning storage for IR nodes addressed by small, stable slot indices.
//!
//! Removed slots go on a LIFO free list and are handed out again before the backing
//! array grows. Every element carries its own slot index (see [`Indexed`]), which the
//! collection rewrites when [`SparseCollection::pack_indices`] moves it.

use std::fmt;

use crate::collection::indexed::Indexed;
use crate::collection::iter::{Iter, IterMut};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("slot {index} out of bounds for collection of size {size}")]
    OutOfBounds { index: usize, size: usize },
    #[error("slot {index} is empty")]
    EmptySlot { index: usize },
    #[error("slot {slot} holds an element that claims slot {stored}")]
    IndexMismatch { slot: usize, stored: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CollectionStats {
    pub size: usize,
    pub live: usize,
    pub free: usize,
}

pub struct SparseCollection<T> {
    slots: Vec<Option<Box<T>>>,
    free_list: Vec<usize>,
}

impl<T> SparseCollection<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    /// Backing array length, including empty slots awaiting reuse.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// True when no slot has been allocated, regardless of how many are live.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    pub fn is_compact(&self) -> bool {
        self.free_list.is_empty()
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            size: self.size(),
            live: self.live_count(),
            free: self.free_count(),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Element at `index`, or `None` for an empty slot.
    ///
    /// # Panics
    ///
    /// When `index >= self.size()`.
    pub fn at(&self, index: usize) -> Option<&T> {
        match self.checked_at(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutable form of [`at`](Self::at).
    ///
    /// # Panics
    ///
    /// When `index >= self.size()`.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        let size = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) => slot.as_deref_mut(),
            None => panic!("{}", CollectionError::OutOfBounds { index, size }),
        }
    }

    pub fn checked_at(&self, index: usize) -> Result<Option<&T>, CollectionError> {
        self.slots
            .get(index)
            .map(|slot| slot.as_deref())
            .ok_or(CollectionError::OutOfBounds {
                index,
                size: self.slots.len(),
            })
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_deref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_deref_mut()
    }

    /// Drops every element and forgets all slots.
    pub fn clear_all(&mut self) {
        self.free_list.clear();
        self.slots.clear();
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.slots)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(&mut self.slots)
    }
}

impl<T: Indexed> SparseCollection<T> {
    /// Takes ownership of `value` and places it in the most recently freed slot, or
    /// in a new slot at the end when nothing is free.
    pub fn add(&mut self, mut value: Box<T>) -> &mut T {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };

        value.set_slot_index(index);
        let slot = &mut self.slots[index];
        debug_assert!(slot.is_none(), "free slot {index} was occupied");
        &mut **slot.insert(value)
    }

    pub fn add_new(&mut self, value: T) -> &mut T {
        self.add(Box::new(value))
    }

    pub fn clone_and_add(&mut self, source: &T) -> &mut T
    where
        T: Clone,
    {
        self.add(Box::new(source.clone()))
    }

    /// Empties slot `index` and returns its element to the caller.
    ///
    /// # Panics
    ///
    /// When the slot is out of range, empty, or holds an element whose stored index
    /// disagrees with `index`. Each of these means the caller's handle is stale.
    pub fn remove(&mut self, index: usize) -> Box<T> {
        match self.checked_remove(index) {
            Ok(value) => value,
            Err(err) => panic!("stale handle: {err}"),
        }
    }

    pub fn checked_remove(&mut self, index: usize) -> Result<Box<T>, CollectionError> {
        let size = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(CollectionError::OutOfBounds { index, size })?;
        let stored = match slot {
            Some(value) => value.slot_index(),
            None => return Err(CollectionError::EmptySlot { index }),
        };
        if stored != index {
            return Err(CollectionError::IndexMismatch {
                slot: index,
                stored,
            });
        }

        self.free_list.push(index);
        slot.take().ok_or(CollectionError::EmptySlot { index })
    }

    /// Moves live elements from the tail into holes until the live elements occupy a
    /// contiguous prefix, then truncates the backing array.
    ///
    /// Elements that were already left of the first hole keep their index. Moved
    /// elements get a new one, so indices held outside the collection go stale; use
    /// [`pack_indices_with`](Self::pack_indices_with) to rewrite them.
    pub fn pack_indices(&mut self) {
        self.pack_indices_with(|_, _| {});
    }

    /// Same as [`pack_indices`](Self::pack_indices), calling `on_move(old, new)` for
    /// every element that changes slot.
    pub fn pack_indices_with<F>(&mut self, mut on_move: F)
    where
        F: FnMut(usize, usize),
    {
        if self.free_list.is_empty() {
            return;
        }

        let mut hole = 0;
        let mut end = self.slots.len();

        loop {
            while hole < end && self.slots[hole].is_some() {
                hole += 1;
            }
            if hole == end {
                break;
            }
            debug_assert!(self.slots[hole].is_none());

            loop {
                end -= 1;
                if self.slots[end].is_some() || end <= hole {
                    break;
                }
            }
            if hole == end {
                break;
            }

            if let Some(mut value) = self.slots[end].take() {
                value.set_slot_index(hole);
                on_move(end, hole);
                self.slots[hole] = Some(value);
            }
            hole += 1;
        }

        self.free_list.clear();
        self.slots.truncate(end);
    }
}

impl<T> Default for SparseCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Indexed + fmt::Debug> fmt::Debug for SparseCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|value| (value.slot_index(), value)))
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a SparseCollection<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut SparseCollection<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
