use serde::{Deserialize, Serialize};

/// A contiguous row range assigned to one copy worker.
///
/// Partitions are produced once per run by the planner and are immutable
/// afterwards: they are contiguous, non-overlapping, and their lengths sum
/// exactly to the row count observed at planning time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub index: usize,
    pub offset: u64,
    pub length: u64,
}

impl Partition {
    pub fn new(index: usize, offset: u64, length: u64) -> Self {
        Partition {
            index,
            offset,
            length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}
