use crate::{
    branch::{BranchState, TransactionBranch},
    error::CopyError,
    summary::{RunOutcome, RunSummary},
    worker::{CopyWorker, WorkerOutcome},
};
use connectors::{error::DbError, provider::ConnectionProvider, source::SourceReader};
use engine_core::{progress::ProgressTable, settings::CopySettings};
use futures::future::join_all;
use model::xid::XidGenerator;
use planner::plan::CopyPlan;
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Drives one copy run end to end: plan the partitions, open one
/// destination branch and one source reader per worker, run the copy, then
/// settle every branch through two-phase commit (or roll all of them back).
///
/// Commit policy: any failure anywhere before the second commit phase rolls
/// back every branch, so the destination table is untouched. Once the first
/// `XA COMMIT` / `COMMIT PREPARED` has been issued the run is past the
/// point of no return and a later branch failure is surfaced as an error
/// that needs operator attention, not rolled back.
pub struct CopyCoordinator {
    provider: Arc<dyn ConnectionProvider>,
    settings: CopySettings,
    progress: Arc<ProgressTable>,
    cancel: CancellationToken,
}

impl CopyCoordinator {
    pub fn new(
        provider: Arc<dyn ConnectionProvider>,
        settings: CopySettings,
        progress: Arc<ProgressTable>,
        cancel: CancellationToken,
    ) -> Self {
        CopyCoordinator {
            provider,
            settings,
            progress,
            cancel,
        }
    }

    pub async fn run(self) -> Result<RunSummary, CopyError> {
        let started = Instant::now();

        let plan = self.plan().await?;
        info!(
            rows = plan.row_count,
            partitions = plan.partitions.len(),
            order_column = plan.order_column.as_deref().unwrap_or("<none>"),
            "copy planned"
        );

        self.progress.set_aggregate_total(plan.row_count);
        for partition in &plan.partitions {
            self.progress.set_total(partition.index, partition.length);
        }

        if plan.partitions.is_empty() {
            return Ok(RunSummary {
                rows_planned: 0,
                rows_copied: 0,
                outcome: RunOutcome::Committed,
                worker_errors: Vec::new(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        let mut branches = self.open_branches(plan.partitions.len()).await?;
        let sources = match self.open_sources(plan.partitions.len()).await {
            Ok(sources) => sources,
            Err(err) => {
                self.abort(&mut branches).await;
                return Err(err);
            }
        };

        let outcomes = self.run_workers(&plan, &mut branches, sources).await;

        let all_copied = outcomes.iter().all(WorkerOutcome::success);
        let settled = if all_copied && !self.cancel.is_cancelled() {
            self.finish_commit(&mut branches).await
        } else {
            self.finish_rollback(&mut branches).await;
            Ok(RunOutcome::RolledBack)
        };

        for branch in &mut branches {
            branch.close().await;
        }
        let outcome = settled?;

        let worker_errors: Vec<String> = outcomes
            .iter()
            .filter_map(|o| {
                o.error
                    .as_ref()
                    .map(|e| format!("partition {}: {e}", o.partition_index))
            })
            .collect();

        let rows_copied = match outcome {
            RunOutcome::Committed => outcomes.iter().map(|o| o.rows_copied).sum(),
            RunOutcome::RolledBack => 0,
        };

        Ok(RunSummary {
            rows_planned: plan.row_count,
            rows_copied,
            outcome,
            worker_errors,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Counts the source rows and probes for an ordering column on a
    /// short-lived control connection.
    async fn plan(&self) -> Result<CopyPlan, CopyError> {
        let mut control = self.provider.open_source().await?;

        let result = self.plan_on(control.as_mut()).await;
        if let Err(err) = control.close().await {
            warn!(error = %err, "closing control connection failed");
        }
        result
    }

    async fn plan_on(&self, control: &mut dyn SourceReader) -> Result<CopyPlan, CopyError> {
        let row_count = control
            .count(&self.settings.source_table)
            .await
            .map_err(|e| CopyError::Planning(e.to_string()))?;

        // A missing ordering column only costs pagination stability, so a
        // failed probe degrades instead of failing the run.
        let order_column = match control
            .find_ordering_column(&self.settings.source_table)
            .await
        {
            Ok(column) => column,
            Err(err) => {
                warn!(error = %err, "index probe failed, copying without ORDER BY");
                None
            }
        };
        if order_column.is_none() && row_count > 0 {
            warn!(
                table = %self.settings.source_table,
                "no usable index, page boundaries rely on a stable scan order"
            );
        }

        CopyPlan::new(row_count, self.settings.worker_count, order_column)
            .map_err(|e| CopyError::Planning(e.to_string()))
    }

    /// Opens and begins one destination branch per partition. Any failure
    /// aborts the branches already opened.
    async fn open_branches(&self, count: usize) -> Result<Vec<TransactionBranch>, CopyError> {
        let mut generator = XidGenerator::new();
        let mut branches = Vec::with_capacity(count);

        for index in 0..count {
            let conn = match self.provider.open_destination().await {
                Ok(conn) => conn,
                Err(err) => {
                    self.abort(&mut branches).await;
                    return Err(err.into());
                }
            };
            match TransactionBranch::open(index, generator.next_xid(), conn).await {
                Ok(branch) => branches.push(branch),
                Err(err) => {
                    self.abort(&mut branches).await;
                    return Err(err);
                }
            }
        }
        Ok(branches)
    }

    /// Opens one source reader per partition so no connection ever serves
    /// two workers.
    async fn open_sources(&self, count: usize) -> Result<Vec<Box<dyn SourceReader>>, CopyError> {
        let mut sources = Vec::with_capacity(count);
        for _ in 0..count {
            sources.push(self.provider.open_source().await?);
        }
        Ok(sources)
    }

    /// Spawns one worker task per partition and waits for all of them. A
    /// failed worker does not interrupt its siblings; they are drained so
    /// the summary can report how far each partition got, and the rollback
    /// covers all branches regardless.
    async fn run_workers(
        &self,
        plan: &CopyPlan,
        branches: &mut [TransactionBranch],
        sources: Vec<Box<dyn SourceReader>>,
    ) -> Vec<WorkerOutcome> {
        let mut handles = Vec::with_capacity(branches.len());

        for (branch, source) in branches.iter_mut().zip(sources) {
            let worker = CopyWorker {
                partition: plan.partitions[branch.index],
                source,
                // Freshly opened branches always hold their connection.
                destination: match branch.take_conn() {
                    Some(conn) => conn,
                    None => continue,
                },
                source_table: self.settings.source_table.clone(),
                destination_table: self.settings.destination_table.clone(),
                order_column: plan.order_column.clone(),
                batch_size: self.settings.batch_size,
                progress: Arc::clone(&self.progress),
                cancel: self.cancel.clone(),
            };

            handles.push(tokio::spawn(worker.run()));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok((outcome, conn)) => {
                    branches[outcome.partition_index].put_conn(conn);
                    outcomes.push(outcome);
                }
                Err(err) => {
                    // The branch connection died with the task; its rollback
                    // below will log and move on.
                    error!(partition = index, error = %err, "worker task panicked");
                    self.cancel.cancel();
                    outcomes.push(WorkerOutcome {
                        partition_index: index,
                        rows_copied: 0,
                        error: Some(DbError::Unknown(err.to_string())),
                    });
                }
            }
        }
        outcomes
    }

    /// Second half of a clean run: end and prepare every branch, then issue
    /// the second-phase commits. A veto in either of the first two phases
    /// rolls the whole run back.
    async fn finish_commit(
        &self,
        branches: &mut [TransactionBranch],
    ) -> Result<RunOutcome, CopyError> {
        for index in 0..branches.len() {
            if let Err(err) = branches[index].end().await {
                error!(branch = index, error = %err, "branch end failed, rolling back");
                self.finish_rollback(branches).await;
                return Ok(RunOutcome::RolledBack);
            }
        }

        for index in 0..branches.len() {
            if let Err(err) = branches[index].prepare().await {
                error!(branch = index, error = %err, "branch vetoed prepare, rolling back");
                self.finish_rollback(branches).await;
                return Ok(RunOutcome::RolledBack);
            }
        }

        let mut commit_failure = None;
        for branch in branches.iter_mut() {
            if let Err(err) = branch.commit().await {
                error!(branch = branch.index, xid = %branch.xid, error = %err,
                    "second-phase commit failed, branch left prepared");
                commit_failure.get_or_insert(err);
            }
        }
        match commit_failure {
            Some(err) => Err(err),
            None => {
                info!("all branches committed");
                Ok(RunOutcome::Committed)
            }
        }
    }

    /// Rolls back every branch that still has something to roll back.
    /// Best-effort by design of the statements involved: each branch is
    /// attempted regardless of what happened to the previous one.
    async fn finish_rollback(&self, branches: &mut [TransactionBranch]) {
        for branch in branches.iter_mut() {
            if matches!(
                branch.state,
                BranchState::Committed | BranchState::RolledBack
            ) {
                continue;
            }
            if let Err(err) = branch.rollback().await {
                warn!(branch = branch.index, xid = %branch.xid, error = %err,
                    "branch rollback failed");
            }
        }
    }

    /// Setup-phase bailout: roll back and release whatever was opened.
    async fn abort(&self, branches: &mut [TransactionBranch]) {
        self.finish_rollback(branches).await;
        for branch in branches.iter_mut() {
            branch.close().await;
        }
    }
}
