pub mod core;
pub mod partition;
pub mod records;
pub mod xid;
