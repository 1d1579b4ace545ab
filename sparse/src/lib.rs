pub mod collection;
pub mod ir;
pub mod script;
pub mod side;
