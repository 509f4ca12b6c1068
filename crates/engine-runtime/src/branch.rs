use crate::error::CopyError;
use connectors::{destination::DestinationBranch, error::DbError};
use model::xid::Xid;
use tracing::warn;

/// Lifecycle of one destination branch, as the coordinator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Active,
    Ended,
    Prepared,
    Committed,
    RolledBack,
    Failed,
}

/// One destination connection plus the transaction state the coordinator
/// has driven it into.
///
/// The connection is lent to a worker for the copy phase (`take_conn` /
/// `put_conn`); every transaction-control call stays here so state
/// transitions are recorded in exactly one place.
pub struct TransactionBranch {
    pub index: usize,
    pub xid: Xid,
    pub state: BranchState,
    conn: Option<Box<dyn DestinationBranch>>,
}

impl TransactionBranch {
    pub async fn open(
        index: usize,
        xid: Xid,
        mut conn: Box<dyn DestinationBranch>,
    ) -> Result<Self, CopyError> {
        conn.begin(&xid)
            .await
            .map_err(|source| Self::failure(index, "begin", source))?;
        Ok(TransactionBranch {
            index,
            xid,
            state: BranchState::Active,
            conn: Some(conn),
        })
    }

    fn failure(branch: usize, op: &'static str, source: DbError) -> CopyError {
        CopyError::Branch { branch, op, source }
    }

    pub fn take_conn(&mut self) -> Option<Box<dyn DestinationBranch>> {
        self.conn.take()
    }

    pub fn put_conn(&mut self, conn: Box<dyn DestinationBranch>) {
        self.conn = Some(conn);
    }

    fn conn(&mut self) -> Result<&mut Box<dyn DestinationBranch>, CopyError> {
        let index = self.index;
        self.conn
            .as_mut()
            .ok_or_else(|| Self::failure(index, "access", DbError::Closed))
    }

    fn settle(&mut self, op: &'static str, next: BranchState, result: Result<(), DbError>) -> Result<(), CopyError> {
        match result {
            Ok(()) => {
                self.state = next;
                Ok(())
            }
            Err(source) => {
                self.state = BranchState::Failed;
                Err(Self::failure(self.index, op, source))
            }
        }
    }

    pub async fn end(&mut self) -> Result<(), CopyError> {
        let result = self.conn()?.end().await;
        self.settle("end", BranchState::Ended, result)
    }

    pub async fn prepare(&mut self) -> Result<(), CopyError> {
        let result = self.conn()?.prepare().await;
        self.settle("prepare", BranchState::Prepared, result)
    }

    pub async fn commit(&mut self) -> Result<(), CopyError> {
        let result = self.conn()?.commit().await;
        self.settle("commit", BranchState::Committed, result)
    }

    pub async fn rollback(&mut self) -> Result<(), CopyError> {
        let result = self.conn()?.rollback().await;
        self.settle("rollback", BranchState::RolledBack, result)
    }

    /// Releases the connection; failures are logged, never propagated.
    pub async fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(error) = conn.close().await {
                warn!(branch = self.index, %error, "closing branch connection failed");
            }
        }
    }
}
