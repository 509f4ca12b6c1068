use crate::{
    error::{ConnectorError, DbError},
    requests::FetchRequest,
    source::SourceReader,
    sql::mysql::params,
};
use async_trait::async_trait;
use model::records::row::Row;
use mysql_async::{Conn, Opts, prelude::Queryable};
use planner::query::{dialect, select};
use tracing::debug;

const FIND_INDEX_SQL: &str = include_str!("sql/find_index.sql");
const FIND_INDEX_IN_SCHEMA_SQL: &str = include_str!("sql/find_index_in_schema.sql");

/// One MySQL read session holding a REPEATABLE READ snapshot.
pub struct MySqlSourceReader {
    conn: Option<Conn>,
}

impl MySqlSourceReader {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url).map_err(mysql_async::Error::from)?;
        let mut conn = Conn::new(opts).await?;
        conn.query_drop("SET SESSION TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .await?;
        conn.query_drop("START TRANSACTION WITH CONSISTENT SNAPSHOT")
            .await?;
        Ok(MySqlSourceReader { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut Conn, DbError> {
        self.conn.as_mut().ok_or(DbError::Closed)
    }
}

#[async_trait]
impl SourceReader for MySqlSourceReader {
    async fn count(&mut self, table: &str) -> Result<u64, DbError> {
        let sql = select::count_rows(&dialect::MySql, table);
        let count: Option<i64> = self.conn()?.query_first(sql).await?;
        count
            .map(|c| c as u64)
            .ok_or_else(|| DbError::Decode("count query returned no row".into()))
    }

    async fn find_ordering_column(&mut self, table: &str) -> Result<Option<String>, DbError> {
        let column: Option<String> = match table.split_once('.') {
            Some((schema, name)) => {
                self.conn()?
                    .exec_first(FIND_INDEX_IN_SCHEMA_SQL, (schema, name))
                    .await?
            }
            None => self.conn()?.exec_first(FIND_INDEX_SQL, (table,)).await?,
        };

        if let Some(column) = &column {
            debug!(table, column, "usable index found");
        }
        Ok(column)
    }

    async fn fetch_rows(&mut self, request: &FetchRequest) -> Result<Vec<Row>, DbError> {
        let sql = select::range_select(
            &dialect::MySql,
            &request.table,
            request.order_column.as_deref(),
        );
        let rows: Vec<mysql_async::Row> = self
            .conn()?
            .exec(sql, (request.limit, request.offset))
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                Row::new(
                    row.unwrap()
                        .into_iter()
                        .map(params::from_mysql_value)
                        .collect(),
                )
            })
            .collect())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(mut conn) = self.conn.take() {
            let rollback = conn.query_drop("ROLLBACK").await;
            conn.disconnect().await?;
            rollback?;
        }
        Ok(())
    }
}
