pub mod index_map;
pub mod index_set;
