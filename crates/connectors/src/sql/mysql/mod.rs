pub mod branch;
pub mod params;
pub mod reader;
