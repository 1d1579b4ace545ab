pub mod ast;
pub mod executor;
pub mod parser;
