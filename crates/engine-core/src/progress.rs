use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time reading of one progress slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub done: u64,
    pub total: u64,
}

impl ProgressSnapshot {
    /// Completion in percent; an empty slot counts as fully done.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.done * 100) / self.total).min(100) as u8
    }
}

struct Slot {
    done: AtomicU64,
    total: AtomicU64,
}

impl Slot {
    fn new() -> Self {
        Slot {
            done: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            done: self.done.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }
}

/// Shared lock-free progress board: one slot per worker plus a trailing
/// aggregate slot for the whole run.
///
/// Workers publish absolute per-partition counts into their own slot and
/// bump the aggregate by the delta they just copied; readers only ever
/// observe snapshots, so a report may trail a worker by one batch but never
/// tears.
pub struct ProgressTable {
    slots: Vec<Slot>,
}

impl ProgressTable {
    pub fn new(worker_count: usize) -> Self {
        let slots = (0..worker_count + 1).map(|_| Slot::new()).collect();
        ProgressTable { slots }
    }

    pub fn worker_count(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn set_total(&self, worker: usize, total: u64) {
        self.slots[worker].total.store(total, Ordering::SeqCst);
    }

    /// Absolute count of rows the worker has copied from its partition.
    pub fn set_progress(&self, worker: usize, done: u64) {
        self.slots[worker].done.store(done, Ordering::SeqCst);
    }

    pub fn set_aggregate_total(&self, total: u64) {
        if let Some(slot) = self.slots.last() {
            slot.total.store(total, Ordering::SeqCst);
        }
    }

    pub fn add_aggregate(&self, delta: u64) {
        if let Some(slot) = self.slots.last() {
            slot.done.fetch_add(delta, Ordering::SeqCst);
        }
    }

    pub fn worker(&self, worker: usize) -> ProgressSnapshot {
        self.slots[worker].snapshot()
    }

    pub fn aggregate(&self) -> ProgressSnapshot {
        match self.slots.last() {
            Some(slot) => slot.snapshot(),
            None => ProgressSnapshot { done: 0, total: 0 },
        }
    }

    pub fn is_complete(&self) -> bool {
        let aggregate = self.aggregate();
        aggregate.done >= aggregate.total
    }

    /// Per-worker snapshots, aggregate slot excluded.
    pub fn snapshot(&self) -> Vec<ProgressSnapshot> {
        self.slots[..self.slots.len() - 1]
            .iter()
            .map(Slot::snapshot)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn tracks_per_worker_and_aggregate_counts() {
        let table = ProgressTable::new(3);
        table.set_aggregate_total(10);
        table.set_total(0, 3);
        table.set_total(1, 3);
        table.set_total(2, 4);

        table.set_progress(0, 3);
        table.add_aggregate(3);
        table.set_progress(2, 2);
        table.add_aggregate(2);

        assert_eq!(table.worker(0).percent(), 100);
        assert_eq!(table.worker(1).percent(), 0);
        assert_eq!(table.worker(2).percent(), 50);
        assert_eq!(table.aggregate(), ProgressSnapshot { done: 5, total: 10 });
        assert!(!table.is_complete());

        table.set_progress(1, 3);
        table.add_aggregate(3);
        table.set_progress(2, 4);
        table.add_aggregate(2);
        assert!(table.is_complete());
    }

    #[test]
    fn empty_partition_reads_as_done() {
        let table = ProgressTable::new(1);
        table.set_total(0, 0);
        assert_eq!(table.worker(0).percent(), 100);
        assert!(table.is_complete());
    }

    #[test]
    fn concurrent_aggregate_updates_never_lose_rows() {
        let table = Arc::new(ProgressTable::new(4));
        table.set_aggregate_total(4 * 1000);

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for done in 1..=1000u64 {
                        table.set_progress(worker, done);
                        table.add_aggregate(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.aggregate().done, 4000);
        assert!(table.is_complete());
    }
}
