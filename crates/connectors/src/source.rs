use crate::{error::DbError, requests::FetchRequest};
use async_trait::async_trait;
use model::records::row::Row;

/// Read side of a copy run.
///
/// Each worker owns its own reader so no connection ever serves concurrent
/// statements; the session runs a REPEATABLE READ transaction opened at
/// connect time and rolled back on `close` (the copy never writes to the
/// source, so commit and rollback are equivalent there).
#[async_trait]
pub trait SourceReader: Send {
    /// Row count of `table` as seen by this session's snapshot.
    async fn count(&mut self, table: &str) -> Result<u64, DbError>;

    /// Best-effort lookup of a usable ordering column: a single-column
    /// unique index, non-nullable, with no filter or function expression.
    /// Uniqueness is load-bearing: the range scan is re-executed once per
    /// page, and only a total order keeps the page boundaries consistent
    /// across executions; a tied key could reorder between pages and make
    /// the copy duplicate one row and drop another. Absence is not an
    /// error; it only disables order-stable pagination.
    async fn find_ordering_column(&mut self, table: &str) -> Result<Option<String>, DbError>;

    /// Fetches one page of the partition range scan.
    async fn fetch_rows(&mut self, request: &FetchRequest) -> Result<Vec<Row>, DbError>;

    /// Rolls back the read transaction and releases the connection.
    async fn close(&mut self) -> Result<(), DbError>;
}
