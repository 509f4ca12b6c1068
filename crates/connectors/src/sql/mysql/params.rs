use chrono::{Datelike, NaiveDate, Timelike};
use model::{core::value::Value, records::row::Row};
use mysql_async::Value as MySqlValue;
use mysql_common::params::Params;

/// Binds one row positionally for the destination insert.
pub fn to_params(row: &Row) -> Params {
    Params::Positional(row.values.iter().map(to_mysql_value).collect())
}

pub fn to_mysql_value(value: &Value) -> MySqlValue {
    match value {
        Value::Int(i) => MySqlValue::Int(*i),
        Value::Uint(u) => MySqlValue::UInt(*u),
        Value::Float(f) => MySqlValue::Double(*f),
        // The server coerces the textual form back into DECIMAL.
        Value::Decimal(d) => MySqlValue::Bytes(d.to_string().into_bytes()),
        Value::String(s) => MySqlValue::Bytes(s.clone().into_bytes()),
        Value::Boolean(b) => MySqlValue::Int(if *b { 1 } else { 0 }),
        Value::Json(j) => MySqlValue::Bytes(j.to_string().into_bytes()),
        Value::Uuid(u) => MySqlValue::Bytes(u.to_string().into_bytes()),
        Value::Bytes(b) => MySqlValue::Bytes(b.clone()),
        Value::Date(d) => {
            MySqlValue::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
        Value::Timestamp(ts) => naive_to_mysql(&ts.naive_utc()),
        Value::TimestampNaive(ts) => naive_to_mysql(ts),
        Value::Null => MySqlValue::NULL,
    }
}

fn naive_to_mysql(naive: &chrono::NaiveDateTime) -> MySqlValue {
    MySqlValue::Date(
        naive.year() as u16,
        naive.month() as u8,
        naive.day() as u8,
        naive.hour() as u8,
        naive.minute() as u8,
        naive.second() as u8,
        naive.and_utc().timestamp_subsec_micros(),
    )
}

/// Decodes one driver value into the transport value.
///
/// Text-ish columns arrive as raw bytes from the wire; valid UTF-8 is kept
/// as a string (which binds identically on the way back in), anything else
/// stays as bytes.
pub fn from_mysql_value(value: MySqlValue) -> Value {
    match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(i) => Value::Int(i),
        MySqlValue::UInt(u) => Value::Uint(u),
        MySqlValue::Float(f) => Value::Float(f as f64),
        MySqlValue::Double(d) => Value::Float(d),
        MySqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::String(text),
            Err(err) => Value::Bytes(err.into_bytes()),
        },
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            match NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32) {
                Some(date) if hour == 0 && minute == 0 && second == 0 && micros == 0 => {
                    Value::Date(date)
                }
                Some(date) => date
                    .and_hms_micro_opt(hour as u32, minute as u32, second as u32, micros)
                    .map(Value::TimestampNaive)
                    .unwrap_or(Value::Null),
                None => Value::Null,
            }
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            Value::String(format!(
                "{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_bytes_round_trip_as_string() {
        let decoded = from_mysql_value(MySqlValue::Bytes(b"hello".to_vec()));
        assert_eq!(decoded, Value::String("hello".into()));
        assert_eq!(
            to_mysql_value(&decoded),
            MySqlValue::Bytes(b"hello".to_vec())
        );
    }

    #[test]
    fn non_utf8_bytes_stay_binary() {
        let decoded = from_mysql_value(MySqlValue::Bytes(vec![0xff, 0xfe, 0x00]));
        assert_eq!(decoded, Value::Bytes(vec![0xff, 0xfe, 0x00]));
    }

    #[test]
    fn midnight_date_is_a_date_not_a_timestamp() {
        let decoded = from_mysql_value(MySqlValue::Date(2024, 3, 1, 0, 0, 0, 0));
        assert!(matches!(decoded, Value::Date(_)));

        let decoded = from_mysql_value(MySqlValue::Date(2024, 3, 1, 12, 30, 0, 0));
        assert!(matches!(decoded, Value::TimestampNaive(_)));
    }
}
