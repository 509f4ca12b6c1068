use crate::{
    coordinator::CopyCoordinator,
    summary::RunOutcome,
    tests::{MockProvider, MockState, int_rows},
};
use connectors::provider::AtomicityMode;
use engine_core::{progress::ProgressTable, settings::CopySettings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn settings(workers: usize, batch_size: usize) -> CopySettings {
    CopySettings {
        source_table: "src".into(),
        destination_table: "dst".into(),
        worker_count: workers,
        batch_size,
        atomicity: AtomicityMode::Global,
    }
}

fn coordinator(
    provider: MockProvider,
    settings: CopySettings,
) -> (CopyCoordinator, Arc<ProgressTable>, CancellationToken) {
    let progress = Arc::new(ProgressTable::new(settings.worker_count));
    let cancel = CancellationToken::new();
    let coordinator = CopyCoordinator::new(
        Arc::new(provider),
        settings,
        Arc::clone(&progress),
        cancel.clone(),
    );
    (coordinator, progress, cancel)
}

#[tokio::test]
async fn clean_run_commits_every_row() {
    let state = MockState::shared(int_rows(10));
    let provider = MockProvider::new(Arc::clone(&state));
    let (coordinator, progress, _cancel) = coordinator(provider, settings(3, 4));

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Committed);
    assert_eq!(summary.rows_planned, 10);
    assert_eq!(summary.rows_copied, 10);
    assert!(summary.worker_errors.is_empty());
    assert!(progress.is_complete());

    let state = state.lock().unwrap();
    assert_eq!(state.committed_rows.len(), 10);
    assert_eq!(state.branches_opened, 3);
    // Phases are strict: every end precedes every prepare precedes every
    // commit.
    let phase_of = |op: &str| match op {
        "begin" => 0,
        "end" => 1,
        "prepare" => 2,
        "commit" => 3,
        "close" => 4,
        other => panic!("unexpected op {other}"),
    };
    let phases: Vec<i32> = state.ops.iter().map(|(_, op)| phase_of(op)).collect();
    let mut sorted = phases.clone();
    sorted.sort();
    assert_eq!(phases, sorted);
}

#[tokio::test]
async fn insert_failure_rolls_back_every_branch() {
    let state = MockState::shared(int_rows(10));
    let mut provider = MockProvider::new(Arc::clone(&state));
    provider.fail_insert_on = Some(1);
    let (coordinator, _progress, _cancel) = coordinator(provider, settings(3, 4));

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::RolledBack);
    assert_eq!(summary.rows_copied, 0);
    assert!(!summary.worker_errors.is_empty());

    let state = state.lock().unwrap();
    assert!(state.committed_rows.is_empty());
    assert!(state.ops.iter().all(|(_, op)| *op != "commit"));
    let rollbacks = state.ops.iter().filter(|(_, op)| *op == "rollback").count();
    assert_eq!(rollbacks, 3);
}

#[tokio::test]
async fn prepare_veto_rolls_back_the_run() {
    let state = MockState::shared(int_rows(6));
    let mut provider = MockProvider::new(Arc::clone(&state));
    provider.fail_prepare_on = Some(0);
    let (coordinator, _progress, _cancel) = coordinator(provider, settings(2, 3));

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::RolledBack);
    // The copy itself succeeded; only the commit was vetoed.
    assert!(summary.worker_errors.is_empty());

    let state = state.lock().unwrap();
    assert!(state.committed_rows.is_empty());
    assert!(state.ops.iter().all(|(_, op)| *op != "commit"));
}

#[tokio::test]
async fn empty_table_commits_without_opening_branches() {
    let state = MockState::shared(Vec::new());
    let provider = MockProvider::new(Arc::clone(&state));
    let (coordinator, progress, _cancel) = coordinator(provider, settings(4, 100));

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Committed);
    assert_eq!(summary.rows_planned, 0);
    assert_eq!(summary.rows_copied, 0);
    assert!(progress.is_complete());

    let state = state.lock().unwrap();
    assert_eq!(state.branches_opened, 0);
    assert!(state.ops.is_empty());
}

#[tokio::test]
async fn cancellation_rolls_back_before_commit() {
    let state = MockState::shared(int_rows(100));
    let provider = MockProvider::new(Arc::clone(&state));
    let (coordinator, _progress, cancel) = coordinator(provider, settings(2, 10));

    cancel.cancel();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::RolledBack);
    assert_eq!(summary.rows_copied, 0);
    assert!(state.lock().unwrap().committed_rows.is_empty());
}

#[tokio::test]
async fn partition_boundaries_cover_the_table_exactly_once() {
    // 7 rows over 3 workers: lengths 2,2,3 with contiguous offsets, so the
    // committed multiset must equal the source multiset.
    let state = MockState::shared(int_rows(7));
    let provider = MockProvider::new(Arc::clone(&state));
    let (coordinator, _progress, _cancel) = coordinator(provider, settings(3, 2));

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.rows_copied, 7);

    let state = state.lock().unwrap();
    let mut copied = state.committed_rows.clone();
    copied.sort_by_key(|row| match row.values[0] {
        model::core::value::Value::Int(v) => v,
        _ => i64::MAX,
    });
    assert_eq!(copied, state.source_rows);
}
