use crate::{
    destination::DestinationBranch,
    error::{ConnectorError, DbError},
    provider::AtomicityMode,
    sql::mysql::params,
};
use async_trait::async_trait;
use model::{records::row::Row, xid::Xid};
use mysql_async::{Conn, Opts, prelude::Queryable};
use planner::query::{dialect, insert};
use tracing::debug;

/// One MySQL destination connection acting as one transaction branch.
///
/// Global atomicity drives the branch through the server's XA statements;
/// per-branch atomicity uses a plain local transaction and turns `end` and
/// `prepare` into no-ops, so the coordinator logic stays identical.
pub struct MySqlBranch {
    conn: Option<Conn>,
    mode: AtomicityMode,
    xid: Option<Xid>,
    ended: bool,
}

impl MySqlBranch {
    pub async fn connect(url: &str, mode: AtomicityMode) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url).map_err(mysql_async::Error::from)?;
        let conn = Conn::new(opts).await?;
        Ok(MySqlBranch {
            conn: Some(conn),
            mode,
            xid: None,
            ended: false,
        })
    }

    fn conn(&mut self) -> Result<&mut Conn, DbError> {
        self.conn.as_mut().ok_or(DbError::Closed)
    }

    /// The `'gtrid','bqual',formatID` literal the XA statements share.
    fn xa_literal(&self) -> Result<String, DbError> {
        let xid = self
            .xid
            .as_ref()
            .ok_or_else(|| DbError::Unknown("branch was never started".into()))?;
        Ok(format!(
            "'{}','{}',{}",
            xid.gtrid_hex(),
            xid.bqual_hex(),
            xid.format_id
        ))
    }
}

#[async_trait]
impl DestinationBranch for MySqlBranch {
    async fn begin(&mut self, xid: &Xid) -> Result<(), DbError> {
        self.xid = Some(*xid);
        self.ended = false;
        match self.mode {
            AtomicityMode::Global => {
                let stmt = format!("XA START {}", self.xa_literal()?);
                debug!(xid = %xid, "starting XA branch");
                self.conn()?.query_drop(stmt).await?;
            }
            AtomicityMode::PerBranch => {
                self.conn()?.query_drop("START TRANSACTION").await?;
            }
        }
        Ok(())
    }

    async fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<(), DbError> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let sql = insert::batch_insert(&dialect::MySql, table, first.column_count(), 1);
        self.conn()?
            .exec_batch(sql, rows.iter().map(params::to_params))
            .await?;
        Ok(())
    }

    async fn end(&mut self) -> Result<(), DbError> {
        if self.mode == AtomicityMode::Global && !self.ended {
            let stmt = format!("XA END {}", self.xa_literal()?);
            self.conn()?.query_drop(stmt).await?;
            self.ended = true;
        }
        Ok(())
    }

    async fn prepare(&mut self) -> Result<(), DbError> {
        if self.mode == AtomicityMode::Global {
            let stmt = format!("XA PREPARE {}", self.xa_literal()?);
            self.conn()?.query_drop(stmt).await?;
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        let stmt = match self.mode {
            AtomicityMode::Global => format!("XA COMMIT {}", self.xa_literal()?),
            AtomicityMode::PerBranch => "COMMIT".to_string(),
        };
        self.conn()?.query_drop(stmt).await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        match self.mode {
            AtomicityMode::Global => {
                if !self.ended {
                    // A branch that failed mid-statement may refuse XA END;
                    // the XA ROLLBACK below is what actually matters.
                    let stmt = format!("XA END {}", self.xa_literal()?);
                    let _ = self.conn()?.query_drop(stmt).await;
                    self.ended = true;
                }
                let stmt = format!("XA ROLLBACK {}", self.xa_literal()?);
                self.conn()?.query_drop(stmt).await?;
            }
            AtomicityMode::PerBranch => {
                self.conn()?.query_drop("ROLLBACK").await?;
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
        }
        Ok(())
    }
}
