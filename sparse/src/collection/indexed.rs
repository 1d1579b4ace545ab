/// An element that remembers which slot of its owning collection it occupies.
///
/// The owning [`SparseCollection`](crate::collection::sparse_collection::SparseCollection)
/// is the only writer of the slot index. Side tables read it to key their storage.
pub trait Indexed {
    fn slot_index(&self) -> usize;
    fn set_slot_index(&mut self, index: usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        index: usize,
    }

    impl Indexed for Probe {
        fn slot_index(&self) -> usize {
            self.index
        }

        fn set_slot_index(&mut self, index: usize) {
            self.index = index;
        }
    }

    #[test]
    fn slot_index_round_trip_through_trait_object() {
        let mut probe = Probe { index: 0 };
        let dynamic: &mut dyn Indexed = &mut probe;
        dynamic.set_slot_index(17);
        assert_eq!(dynamic.slot_index(), 17);
        assert_eq!(probe.index, 17);
    }
}
