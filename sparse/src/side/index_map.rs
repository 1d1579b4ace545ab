use crate::collection::indexed::Indexed;
use crate::collection::sparse_collection::SparseCollection;

/// Dense per-node table keyed by slot index.
///
/// Entries are not moved by compaction; rebuild the table after
/// [`SparseCollection::pack_indices`].
#[derive(Debug, Clone)]
pub struct IndexMap<V> {
    entries: Vec<Option<V>>,
}

impl<V> IndexMap<V> {
    pub fn new(size: usize) -> Self {
        let mut entries = Vec::with_capacity(size);
        entries.resize_with(size, || None);
        Self { entries }
    }

    pub fn with_collection<T>(collection: &SparseCollection<T>) -> Self {
        Self::new(collection.size())
    }

    pub fn resize(&mut self, size: usize) {
        self.entries.resize_with(size, || None);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<T: Indexed>(&self, node: &T) -> Option<&V> {
        self.entry_at(node.slot_index())
    }

    pub fn get_mut<T: Indexed>(&mut self, node: &T) -> Option<&mut V> {
        self.entries.get_mut(node.slot_index())?.as_mut()
    }

    pub fn entry_at(&self, index: usize) -> Option<&V> {
        self.entries.get(index)?.as_ref()
    }

    /// Stores `value` for `node`, growing the table to cover its slot.
    ///
    /// # Panics
    ///
    /// When `node` carries `usize::MAX`, which no collection slot can hold.
    pub fn insert<T: Indexed>(&mut self, node: &T, value: V) -> Option<V> {
        let index = node.slot_index();
        if index >= self.entries.len() {
            match index.checked_add(1) {
                Some(size) => self.resize(size),
                None => panic!("slot index {} cannot key a side table", index),
            }
        }
        self.entries[index].replace(value)
    }

    pub fn remove<T: Indexed>(&mut self, node: &T) -> Option<V> {
        self.entries.get_mut(node.slot_index())?.take()
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }
}
