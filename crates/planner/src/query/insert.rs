//! Builder for the destination-side batch INSERT.
//!
//! The column list is deliberately omitted: the copy is positional and the
//! column count comes from the source result set at runtime, which keeps the
//! whole path table-schema-agnostic.

use crate::query::dialect::Dialect;

/// Builds `INSERT INTO t VALUES (..), (..)` with `row_count` value tuples of
/// `column_count` placeholders each. Placeholders are numbered continuously
/// across rows for dialects that index them.
pub fn batch_insert(
    dialect: &dyn Dialect,
    table: &str,
    column_count: usize,
    row_count: usize,
) -> String {
    let mut sql = format!("INSERT INTO {} VALUES ", dialect.quote_table(table));

    for row in 0..row_count {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for column in 0..column_count {
            if column > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&dialect.get_placeholder(row * column_count + column));
        }
        sql.push(')');
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::dialect::{MySql, Postgres};

    #[test]
    fn single_row_mysql() {
        let sql = batch_insert(&MySql, "orders", 3, 1);
        assert_eq!(sql, "INSERT INTO `orders` VALUES (?, ?, ?)");
    }

    #[test]
    fn multi_row_postgres_numbers_placeholders_continuously() {
        let sql = batch_insert(&Postgres, "orders", 2, 3);
        assert_eq!(
            sql,
            r#"INSERT INTO "orders" VALUES ($1, $2), ($3, $4), ($5, $6)"#
        );
    }
}
