use crate::error::DbError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{core::value::Value, records::row::Row};
use rust_decimal::Decimal;
use tokio_postgres::types::{Json as PgJson, ToSql};
use uuid::Uuid;

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn from_value(value: Value) -> Result<Self, DbError> {
        let param = match value {
            Value::Int(v) => PgParam(Box::new(v)),
            // Postgres has no unsigned bigint; values past i64::MAX must be
            // rejected, not wrapped negative.
            Value::Uint(v) => match i64::try_from(v) {
                Ok(v) => PgParam(Box::new(v)),
                Err(_) => {
                    return Err(DbError::UnsupportedType(format!(
                        "unsigned value {v} exceeds the bigint range"
                    )));
                }
            },
            Value::Float(v) => PgParam(Box::new(v)),
            Value::Decimal(v) => PgParam(Box::new(v)),
            Value::String(v) => PgParam(Box::new(v)),
            Value::Boolean(v) => PgParam(Box::new(v)),
            Value::Json(v) => PgParam(Box::new(PgJson(v))),
            Value::Uuid(v) => PgParam(Box::new(v)),
            Value::Bytes(v) => PgParam(Box::new(v)),
            Value::Date(v) => PgParam(Box::new(v)),
            Value::Timestamp(v) => PgParam(Box::new(v)),
            Value::TimestampNaive(v) => PgParam(Box::new(v)),
            Value::Null => PgParam(Box::new(Option::<String>::None)),
        };
        Ok(param)
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    /// Flattens a batch of rows into the continuous positional parameter
    /// list a multi-row insert expects.
    pub fn from_rows(rows: &[Row]) -> Result<Self, DbError> {
        let total = rows.iter().map(|row| row.column_count()).sum();
        let mut params = Vec::with_capacity(total);
        for row in rows {
            for value in &row.values {
                params.push(PgParam::from_value(value.clone())?);
            }
        }
        Ok(PgParamStore { params })
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|param| param.as_ref()).collect()
    }
}

/// Decodes one fetched row positionally, driven by the result set's column
/// types.
pub fn decode_row(row: &tokio_postgres::Row) -> Result<Row, DbError> {
    let mut values = Vec::with_capacity(row.len());

    for (idx, column) in row.columns().iter().enumerate() {
        let value = match column.type_().name() {
            "bool" => row
                .try_get::<_, Option<bool>>(idx)?
                .map_or(Value::Null, Value::Boolean),
            "int2" => row
                .try_get::<_, Option<i16>>(idx)?
                .map_or(Value::Null, |v| Value::Int(v as i64)),
            "int4" => row
                .try_get::<_, Option<i32>>(idx)?
                .map_or(Value::Null, |v| Value::Int(v as i64)),
            "int8" | "oid" => row
                .try_get::<_, Option<i64>>(idx)?
                .map_or(Value::Null, Value::Int),
            "float4" => row
                .try_get::<_, Option<f32>>(idx)?
                .map_or(Value::Null, |v| Value::Float(v as f64)),
            "float8" => row
                .try_get::<_, Option<f64>>(idx)?
                .map_or(Value::Null, Value::Float),
            "numeric" => row
                .try_get::<_, Option<Decimal>>(idx)?
                .map_or(Value::Null, Value::Decimal),
            "text" | "varchar" | "bpchar" | "char" | "name" => row
                .try_get::<_, Option<String>>(idx)?
                .map_or(Value::Null, Value::String),
            "bytea" => row
                .try_get::<_, Option<Vec<u8>>>(idx)?
                .map_or(Value::Null, Value::Bytes),
            "json" | "jsonb" => row
                .try_get::<_, Option<serde_json::Value>>(idx)?
                .map_or(Value::Null, Value::Json),
            "uuid" => row
                .try_get::<_, Option<Uuid>>(idx)?
                .map_or(Value::Null, Value::Uuid),
            "date" => row
                .try_get::<_, Option<NaiveDate>>(idx)?
                .map_or(Value::Null, Value::Date),
            "timestamp" => row
                .try_get::<_, Option<NaiveDateTime>>(idx)?
                .map_or(Value::Null, Value::TimestampNaive),
            "timestamptz" => row
                .try_get::<_, Option<DateTime<Utc>>>(idx)?
                .map_or(Value::Null, Value::Timestamp),
            other => row
                .try_get::<_, Option<String>>(idx)
                .map_err(|_| DbError::UnsupportedType(other.to_string()))?
                .map_or(Value::Null, Value::String),
        };
        values.push(value);
    }

    Ok(Row::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_values_in_bigint_range_bind() {
        let rows = [Row::new(vec![Value::Uint(42), Value::Int(-1)])];
        let store = PgParamStore::from_rows(&rows).unwrap();
        assert_eq!(store.params.len(), 2);
    }

    #[test]
    fn unsigned_overflow_is_rejected_not_wrapped() {
        let rows = [Row::new(vec![Value::Uint(u64::MAX)])];
        assert!(matches!(
            PgParamStore::from_rows(&rows),
            Err(DbError::UnsupportedType(_))
        ));
    }
}
