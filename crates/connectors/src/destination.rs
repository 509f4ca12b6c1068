use crate::error::DbError;
use async_trait::async_trait;
use model::{records::row::Row, xid::Xid};

/// Write side of a copy run: one destination connection acting as one branch
/// of the run's transaction.
///
/// Which statements back these calls depends on the provider's atomicity
/// mode. Under global atomicity MySQL maps them to `XA START/END/PREPARE/
/// COMMIT/ROLLBACK` and Postgres to `BEGIN` / `PREPARE TRANSACTION` /
/// `COMMIT PREPARED` / `ROLLBACK PREPARED`. Under per-branch atomicity
/// `end` and `prepare` are no-ops and commit/rollback are the plain local
/// statements, so the coordinator drives one state machine either way.
///
/// The worker only calls `insert_batch`; every transaction-control method is
/// the coordinator's to call.
#[async_trait]
pub trait DestinationBranch: Send {
    /// Associates the connection with `xid` and starts the branch.
    async fn begin(&mut self, xid: &Xid) -> Result<(), DbError>;

    /// Inserts one batch of rows positionally. The insert statement is
    /// derived from the column count of the first row.
    async fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<(), DbError>;

    /// Ends the branch's association with the work (XA END).
    async fn end(&mut self) -> Result<(), DbError>;

    /// First commit phase. An error is a veto: the coordinator must roll
    /// back every branch of the run.
    async fn prepare(&mut self) -> Result<(), DbError>;

    /// Second commit phase.
    async fn commit(&mut self) -> Result<(), DbError>;

    /// Rolls the branch back, whatever state it is in.
    async fn rollback(&mut self) -> Result<(), DbError>;

    /// Releases the connection.
    async fn close(&mut self) -> Result<(), DbError>;
}
