pub mod dialect;
pub mod insert;
pub mod select;
