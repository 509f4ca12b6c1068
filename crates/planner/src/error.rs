use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("worker count must be at least 1")]
    NoWorkers,
}
