pub mod branch;
pub mod params;
pub mod reader;
pub(crate) mod utils;
