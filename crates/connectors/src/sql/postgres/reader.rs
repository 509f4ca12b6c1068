use crate::{
    error::{ConnectorError, DbError},
    requests::FetchRequest,
    source::SourceReader,
    sql::postgres::{params, utils},
};
use async_trait::async_trait;
use model::records::row::Row;
use planner::query::{dialect, select};
use tokio_postgres::Client;
use tracing::debug;

const FIND_INDEX_SQL: &str = include_str!("sql/find_index.sql");

/// One Postgres read session holding a REPEATABLE READ snapshot.
pub struct PgSourceReader {
    client: Option<Client>,
}

impl PgSourceReader {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = utils::connect_client(url).await?;
        client
            .batch_execute("BEGIN ISOLATION LEVEL REPEATABLE READ")
            .await
            .map_err(DbError::from)?;
        Ok(PgSourceReader {
            client: Some(client),
        })
    }

    fn client(&mut self) -> Result<&mut Client, DbError> {
        self.client.as_mut().ok_or(DbError::Closed)
    }
}

#[async_trait]
impl SourceReader for PgSourceReader {
    async fn count(&mut self, table: &str) -> Result<u64, DbError> {
        let sql = select::count_rows(&dialect::Postgres, table);
        let row = self.client()?.query_one(sql.as_str(), &[]).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as u64)
    }

    async fn find_ordering_column(&mut self, table: &str) -> Result<Option<String>, DbError> {
        let row = self.client()?.query_opt(FIND_INDEX_SQL, &[&table]).await?;
        let column = match row {
            Some(row) => Some(row.try_get::<_, String>(0)?),
            None => None,
        };

        if let Some(column) = &column {
            debug!(table, column, "usable index found");
        }
        Ok(column)
    }

    async fn fetch_rows(&mut self, request: &FetchRequest) -> Result<Vec<Row>, DbError> {
        let sql = select::range_select(
            &dialect::Postgres,
            &request.table,
            request.order_column.as_deref(),
        );
        let limit = request.limit as i64;
        let offset = request.offset as i64;
        let rows = self
            .client()?
            .query(sql.as_str(), &[&limit, &offset])
            .await?;

        rows.iter().map(params::decode_row).collect()
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(client) = self.client.take() {
            client.batch_execute("ROLLBACK").await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FIND_INDEX_SQL;

    // Same invariant as the MySQL probe: OFFSET paging is only sound over a
    // total order, so the probe must reject non-unique and multi-column
    // indexes.
    #[test]
    fn index_probe_only_accepts_unique_single_column_keys() {
        assert!(FIND_INDEX_SQL.contains("i.indisunique"));
        assert!(FIND_INDEX_SQL.contains("i.indnkeyatts = 1"));
        assert!(FIND_INDEX_SQL.contains("a.attnotnull"));
    }
}
