use std::iter::FusedIterator;

/// Forward cursor over the occupied slots of a collection, in slot order.
pub struct Iter<'a, T> {
    slots: &'a [Option<Box<T>>],
    index: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(slots: &'a [Option<Box<T>>]) -> Self {
        let mut iter = Self { slots, index: 0 };
        iter.index = iter.find_next(0);
        iter
    }

    /// Slot the cursor currently points at; equals the backing length once exhausted.
    pub fn position(&self) -> usize {
        self.index
    }

    fn find_next(&self, mut index: usize) -> usize {
        while index < self.slots.len() && self.slots[index].is_none() {
            index += 1;
        }
        index
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let slots = self.slots;
        let value = slots.get(self.index)?.as_deref();
        self.index = self.find_next(self.index + 1);
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len() - self.index))
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            index: self.index,
        }
    }
}

pub struct IterMut<'a, T> {
    inner: std::slice::IterMut<'a, Option<Box<T>>>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(slots: &'a mut [Option<Box<T>>]) -> Self {
        Self {
            inner: slots.iter_mut(),
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        self.inner.by_ref().find_map(|slot| slot.as_deref_mut())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.inner.len()))
    }
}

impl<T> FusedIterator for IterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(layout: &[Option<u32>]) -> Vec<Option<Box<u32>>> {
        layout.iter().map(|v| v.map(Box::new)).collect()
    }

    #[test]
    fn iter_skips_leading_and_trailing_holes() {
        let backing = slots(&[None, None, Some(7), None, Some(9), None]);
        let iter = Iter::new(&backing);
        assert_eq!(iter.position(), 2);
        assert_eq!(iter.copied().collect::<Vec<_>>(), vec![7, 9]);
    }

    #[test]
    fn iter_over_only_holes_is_empty() {
        let backing = slots(&[None, None, None]);
        let mut iter = Iter::new(&backing);
        assert_eq!(iter.position(), 3);
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn iter_clone_restarts_from_same_position() {
        let backing = slots(&[Some(1), None, Some(2), Some(3)]);
        let mut iter = Iter::new(&backing);
        assert_eq!(iter.next(), Some(&1));
        let fork = iter.clone();
        assert_eq!(iter.collect::<Vec<_>>(), vec![&2, &3]);
        assert_eq!(fork.collect::<Vec<_>>(), vec![&2, &3]);
    }

    #[test]
    fn iter_mut_updates_only_occupied_slots() {
        let mut backing = slots(&[Some(1), None, Some(2)]);
        for value in IterMut::new(&mut backing) {
            *value *= 10;
        }
        assert_eq!(backing[0].as_deref(), Some(&10));
        assert!(backing[1].is_none());
        assert_eq!(backing[2].as_deref(), Some(&20));
    }
}
