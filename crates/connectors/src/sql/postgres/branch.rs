use crate::{
    destination::DestinationBranch,
    error::{ConnectorError, DbError},
    provider::AtomicityMode,
    sql::postgres::{params::PgParamStore, utils},
};
use async_trait::async_trait;
use model::{records::row::Row, xid::Xid};
use planner::query::{dialect, insert};
use tokio_postgres::Client;
use tracing::debug;

/// Postgres caps one statement at 65535 bind parameters; staying a bit
/// under leaves room for odd column counts.
const MAX_BIND_PARAMS: usize = 60_000;

/// One Postgres destination connection acting as one transaction branch.
///
/// Postgres has no XA statement surface; global atomicity maps onto its
/// native two-phase commit instead. `begin` opens a local transaction,
/// `prepare` converts it with `PREPARE TRANSACTION`, and commit/rollback
/// then act on the prepared name. `end` has no Postgres counterpart and is
/// always a no-op.
pub struct PgBranch {
    client: Option<Client>,
    mode: AtomicityMode,
    txn_name: Option<String>,
    prepared: bool,
}

impl PgBranch {
    pub async fn connect(url: &str, mode: AtomicityMode) -> Result<Self, ConnectorError> {
        let client = utils::connect_client(url).await?;
        Ok(PgBranch {
            client: Some(client),
            mode,
            txn_name: None,
            prepared: false,
        })
    }

    fn client(&mut self) -> Result<&mut Client, DbError> {
        self.client.as_mut().ok_or(DbError::Closed)
    }

    fn txn_name(&self) -> Result<&str, DbError> {
        self.txn_name
            .as_deref()
            .ok_or_else(|| DbError::Unknown("branch was never started".into()))
    }
}

#[async_trait]
impl DestinationBranch for PgBranch {
    async fn begin(&mut self, xid: &Xid) -> Result<(), DbError> {
        self.txn_name = Some(format!("parcopy-{xid}"));
        self.prepared = false;
        debug!(xid = %xid, "starting branch transaction");
        self.client()?.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<(), DbError> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let column_count = first.column_count();
        let rows_per_stmt = (MAX_BIND_PARAMS / column_count.max(1)).max(1);

        for chunk in rows.chunks(rows_per_stmt) {
            let sql = insert::batch_insert(&dialect::Postgres, table, column_count, chunk.len());
            let store = PgParamStore::from_rows(chunk)?;
            self.client()?.execute(sql.as_str(), &store.as_refs()).await?;
        }
        Ok(())
    }

    async fn end(&mut self) -> Result<(), DbError> {
        Ok(())
    }

    async fn prepare(&mut self) -> Result<(), DbError> {
        if self.mode == AtomicityMode::Global {
            let stmt = format!("PREPARE TRANSACTION '{}'", self.txn_name()?);
            self.client()?.batch_execute(&stmt).await?;
            self.prepared = true;
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        let stmt = if self.prepared {
            format!("COMMIT PREPARED '{}'", self.txn_name()?)
        } else {
            "COMMIT".to_string()
        };
        self.client()?.batch_execute(&stmt).await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        let stmt = if self.prepared {
            format!("ROLLBACK PREPARED '{}'", self.txn_name()?)
        } else {
            "ROLLBACK".to_string()
        };
        self.client()?.batch_execute(&stmt).await?;
        self.prepared = false;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        self.client.take();
        Ok(())
    }
}
