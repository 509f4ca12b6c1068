//! Builders for the source-side queries: the partition range scan and the
//! planning-time row count. Purely textual, no side effects.

use crate::query::dialect::Dialect;

/// Builds the range SELECT one worker issues for its partition.
///
/// The statement selects every column, optionally ordered by the column the
/// index probe found, and binds two parameters in this order: row limit,
/// then row offset. Without an ordering column the scan falls back to
/// storage order, which can skip or duplicate rows if the storage layer
/// shifts underneath concurrent readers.
pub fn range_select(dialect: &dyn Dialect, table: &str, order_column: Option<&str>) -> String {
    let mut sql = format!("SELECT * FROM {}", dialect.quote_table(table));

    if let Some(column) = order_column {
        sql.push_str(" ORDER BY ");
        sql.push_str(&dialect.quote_identifier(column));
    }

    sql.push_str(" LIMIT ");
    sql.push_str(&dialect.get_placeholder(0));
    sql.push_str(" OFFSET ");
    sql.push_str(&dialect.get_placeholder(1));
    sql
}

/// Builds the planning-time `COUNT(*)` query.
pub fn count_rows(dialect: &dyn Dialect, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", dialect.quote_table(table))
}
