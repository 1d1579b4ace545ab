pub mod procedure;
pub mod value;
