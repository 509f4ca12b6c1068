use crate::error::PlanError;
use model::partition::Partition;
use serde::{Deserialize, Serialize};

/// The immutable plan for one copy run: the row count observed on the
/// source, the optional ordering column discovered by the index probe, and
/// one partition per worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyPlan {
    pub row_count: u64,
    pub order_column: Option<String>,
    pub partitions: Vec<Partition>,
}

impl CopyPlan {
    pub fn new(
        row_count: u64,
        worker_count: usize,
        order_column: Option<String>,
    ) -> Result<Self, PlanError> {
        Ok(CopyPlan {
            row_count,
            order_column,
            partitions: partitions(row_count, worker_count)?,
        })
    }
}

/// Divides `row_count` rows into `worker_count` contiguous partitions.
///
/// Every partition except the last gets `row_count / worker_count` rows; the
/// last one absorbs the remainder. This concentrates up to `worker_count - 1`
/// extra rows on the final worker, a deliberate simplicity/skew trade-off
/// that becomes visible when the remainder is large relative to the base
/// share. A zero row count plans to an empty list ("nothing to copy"), never
/// an error.
pub fn partitions(row_count: u64, worker_count: usize) -> Result<Vec<Partition>, PlanError> {
    if worker_count == 0 {
        return Err(PlanError::NoWorkers);
    }
    if row_count == 0 {
        return Ok(Vec::new());
    }

    let workers = worker_count as u64;
    let base = row_count / workers;
    let remainder = row_count % workers;

    let mut out = Vec::with_capacity(worker_count);
    for index in 0..worker_count {
        let offset = base * index as u64;
        let length = if index == worker_count - 1 {
            base + remainder
        } else {
            base
        };
        out.push(Partition::new(index, offset, length));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(parts: &[Partition], row_count: u64) {
        let mut expected_offset = 0u64;
        for part in parts {
            assert_eq!(part.offset, expected_offset, "partitions are contiguous");
            expected_offset += part.length;
        }
        assert_eq!(expected_offset, row_count, "lengths sum to the row count");
    }

    #[test]
    fn ten_rows_three_workers() {
        let parts = partitions(10, 3).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!((parts[0].offset, parts[0].length), (0, 3));
        assert_eq!((parts[1].offset, parts[1].length), (3, 3));
        assert_eq!((parts[2].offset, parts[2].length), (6, 4));
        assert_covers(&parts, 10);
    }

    #[test]
    fn zero_rows_plans_nothing() {
        let parts = partitions(0, 4).unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(partitions(10, 0), Err(PlanError::NoWorkers)));
    }

    #[test]
    fn fewer_rows_than_workers() {
        let parts = partitions(2, 4).unwrap();
        assert_eq!(parts.len(), 4);
        assert_covers(&parts, 2);
        // All rows land on the last worker; the earlier partitions are empty.
        assert!(parts[..3].iter().all(|p| p.is_empty()));
        assert_eq!(parts[3].length, 2);
    }

    #[test]
    fn planning_is_idempotent() {
        for (rows, workers) in [(0u64, 1usize), (1, 1), (17, 4), (1000, 7), (5, 5)] {
            let a = partitions(rows, workers).unwrap();
            let b = partitions(rows, workers).unwrap();
            assert_eq!(a, b);
            assert_covers(&a, rows);
        }
    }

    #[test]
    fn single_worker_takes_everything() {
        let parts = partitions(123, 1).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!((parts[0].offset, parts[0].length), (0, 123));
    }
}
