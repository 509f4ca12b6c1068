pub mod destination;
pub mod error;
pub mod provider;
pub mod requests;
pub mod source;
pub mod sql;
