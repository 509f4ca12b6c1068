pub mod branch;
pub mod coordinator;
pub mod error;
pub mod summary;
pub mod worker;

#[cfg(test)]
mod tests;
