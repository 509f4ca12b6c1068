use connectors::{
    destination::DestinationBranch, error::DbError, requests::FetchRequest, source::SourceReader,
};
use engine_core::progress::ProgressTable;
use model::partition::Partition;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What one worker did with its partition.
#[derive(Debug)]
pub struct WorkerOutcome {
    pub partition_index: usize,
    pub rows_copied: u64,
    pub error: Option<DbError>,
}

impl WorkerOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one worker needs to copy its partition.
pub struct CopyWorker {
    pub partition: Partition,
    pub source: Box<dyn SourceReader>,
    pub destination: Box<dyn DestinationBranch>,
    pub source_table: String,
    pub destination_table: String,
    pub order_column: Option<String>,
    pub batch_size: usize,
    pub progress: Arc<ProgressTable>,
    pub cancel: CancellationToken,
}

impl CopyWorker {
    /// Copies the partition one page at a time: fetch at most `batch_size`
    /// rows from the source range, insert them into the branch, publish
    /// progress, repeat. The branch connection is returned to the
    /// coordinator whatever happened, because the coordinator still has to
    /// drive its transaction to an end.
    pub async fn run(mut self) -> (WorkerOutcome, Box<dyn DestinationBranch>) {
        let result = self.copy_partition().await;

        if let Err(error) = self.source.close().await {
            warn!(partition = self.partition.index, %error, "closing source reader failed");
        }

        let outcome = match result {
            Ok(rows_copied) => WorkerOutcome {
                partition_index: self.partition.index,
                rows_copied,
                error: None,
            },
            Err(error) => WorkerOutcome {
                partition_index: self.partition.index,
                rows_copied: self.progress.worker(self.partition.index).done,
                error: Some(error),
            },
        };
        (outcome, self.destination)
    }

    async fn copy_partition(&mut self) -> Result<u64, DbError> {
        let mut copied: u64 = 0;

        while copied < self.partition.length {
            if self.cancel.is_cancelled() {
                return Err(DbError::Cancelled);
            }

            let remaining = self.partition.length - copied;
            let request = FetchRequest {
                table: self.source_table.clone(),
                order_column: self.order_column.clone(),
                offset: self.partition.offset + copied,
                limit: (self.batch_size as u64).min(remaining),
            };

            let rows = self.source.fetch_rows(&request).await?;
            if rows.is_empty() {
                // The source shrank under our snapshot-consistent read;
                // nothing more to copy in this range.
                break;
            }

            self.destination
                .insert_batch(&self.destination_table, &rows)
                .await?;

            copied += rows.len() as u64;
            self.progress.set_progress(self.partition.index, copied);
            self.progress.add_aggregate(rows.len() as u64);
        }

        debug!(
            partition = self.partition.index,
            rows = copied,
            "partition copy finished"
        );
        Ok(copied)
    }
}
