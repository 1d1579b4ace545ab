pub mod indexed;
pub mod iter;
pub mod sparse_collection;
