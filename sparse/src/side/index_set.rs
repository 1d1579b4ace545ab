use crate::collection::indexed::Indexed;

const WORD_BITS: usize = u64::BITS as usize;

/// Bitset of slot indices, e.g. the live set of a reachability walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet {
    words: Vec<u64>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(WORD_BITS)],
        }
    }

    /// Returns true when the index was not already present.
    pub fn add<T: Indexed>(&mut self, node: &T) -> bool {
        self.add_index(node.slot_index())
    }

    pub fn add_index(&mut self, index: usize) -> bool {
        let (word, mask) = locate(index);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    pub fn remove<T: Indexed>(&mut self, node: &T) -> bool {
        let (word, mask) = locate(node.slot_index());
        match self.words.get_mut(word) {
            Some(bits) if *bits & mask != 0 => {
                *bits &= !mask;
                true
            }
            _ => false,
        }
    }

    pub fn contains<T: Indexed>(&self, node: &T) -> bool {
        self.contains_index(node.slot_index())
    }

    pub fn contains_index(&self, index: usize) -> bool {
        let (word, mask) = locate(index);
        self.words.get(word).is_some_and(|bits| bits & mask != 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|bits| bits.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|bits| *bits == 0)
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word, &bits)| {
            (0..WORD_BITS)
                .filter(move |bit| bits & (1u64 << bit) != 0)
                .map(move |bit| word * WORD_BITS + bit)
        })
    }
}

fn locate(index: usize) -> (usize, u64) {
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slot(usize);

    impl Indexed for Slot {
        fn slot_index(&self) -> usize {
            self.0
        }

        fn set_slot_index(&mut self, index: usize) {
            self.0 = index;
        }
    }

    #[test]
    fn add_reports_newness() {
        let mut set = IndexSet::new();
        assert!(set.add(&Slot(3)));
        assert!(!set.add(&Slot(3)));
        assert!(set.contains(&Slot(3)));
        assert!(!set.contains(&Slot(4)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn spans_word_boundaries() {
        let mut set = IndexSet::with_capacity(10);
        for index in [0, 63, 64, 130] {
            set.add_index(index);
        }
        assert_eq!(set.indices().collect::<Vec<_>>(), vec![0, 63, 64, 130]);
        assert!(set.remove(&Slot(64)));
        assert!(!set.remove(&Slot(64)));
        assert!(!set.remove(&Slot(10_000)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn clear_empties() {
        let mut set = IndexSet::new();
        set.add_index(7);
        assert!(!set.is_empty());
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains_index(7));
    }
}
