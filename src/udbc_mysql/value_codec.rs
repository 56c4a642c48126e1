use crate::udbc::value::Value;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use mysql_async::consts::ColumnType;
use mysql_async::{Params, Value as MyValue};

#[derive(Clone, Copy, PartialEq)]
enum Temporal {
    Date,
    DateTime,
    /// Decided by the value: midnight reads as a date.
    Either,
}

/// Converts a fetched value using its column type, so a DATETIME or TIMESTAMP
/// at midnight still decodes as a date-time.
pub fn from_mysql_column(v: &MyValue, column_type: ColumnType) -> Value {
    let temporal = match column_type {
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => Temporal::Date,
        ColumnType::MYSQL_TYPE_DATETIME
        | ColumnType::MYSQL_TYPE_DATETIME2
        | ColumnType::MYSQL_TYPE_TIMESTAMP
        | ColumnType::MYSQL_TYPE_TIMESTAMP2 => Temporal::DateTime,
        _ => Temporal::Either,
    };
    match v {
        MyValue::Date(..) => from_mysql_date(v, temporal),
        _ => from_mysql_value(v),
    }
}

fn from_mysql_date(v: &MyValue, temporal: Temporal) -> Value {
    let MyValue::Date(y, m, d, h, min, s, micro) = v else {
        return from_mysql_value(v);
    };
    let Some(date) = NaiveDate::from_ymd_opt(*y as i32, *m as u32, *d as u32) else {
        // zero dates such as 0000-00-00 have no chrono form
        return Value::Str(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            y, m, d, h, min, s
        ));
    };
    let midnight = *h == 0 && *min == 0 && *s == 0 && *micro == 0;
    if temporal == Temporal::Date || (temporal == Temporal::Either && midnight) {
        return Value::Date(date);
    }
    match date.and_hms_micro_opt(*h as u32, *min as u32, *s as u32, *micro) {
        Some(dt) => Value::DateTime(dt),
        None => Value::Date(date),
    }
}

pub fn from_mysql_value(v: &MyValue) -> Value {
    match v {
        MyValue::NULL => Value::Null,
        MyValue::Int(i) => Value::Int(*i),
        MyValue::UInt(u) => Value::UInt(*u),
        MyValue::Float(f) => Value::Float(*f as f64),
        MyValue::Double(d) => Value::Float(*d),
        MyValue::Bytes(b) => Value::Bytes(b.clone()),
        MyValue::Date(..) => from_mysql_date(v, Temporal::Either),
        MyValue::Time(is_neg, days, h, min, s, micro) => {
            let total_h = *days * 24 + (*h as u32);
            match NaiveTime::from_hms_micro_opt(total_h, *min as u32, *s as u32, *micro) {
                Some(t) if !*is_neg => Value::Time(t),
                _ => Value::Str(format!(
                    "{}{:02}:{:02}:{:02}",
                    if *is_neg { "-" } else { "" },
                    total_h,
                    min,
                    s
                )),
            }
        }
    }
}

pub fn to_mysql_value(v: &Value) -> MyValue {
    match v {
        Value::Null => MyValue::NULL,
        Value::Bool(b) => MyValue::Int(if *b { 1 } else { 0 }),
        Value::Int(i) => MyValue::Int(*i),
        Value::UInt(u) => MyValue::UInt(*u),
        Value::Float(f) => MyValue::Double(*f),
        Value::Str(s) => MyValue::Bytes(s.clone().into_bytes()),
        Value::Bytes(b) => MyValue::Bytes(b.clone()),
        Value::Date(d) => MyValue::Date(
            d.year() as u16,
            d.month() as u8,
            d.day() as u8,
            0u8,
            0u8,
            0u8,
            0u32,
        ),
        Value::Time(t) => MyValue::Time(
            false,
            0u32,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1000,
        ),
        Value::DateTime(dt) => MyValue::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.and_utc().timestamp_subsec_micros(),
        ),
        Value::DateTimeUtc(dt) => {
            let ndt = dt.naive_utc();
            MyValue::Date(
                ndt.year() as u16,
                ndt.month() as u8,
                ndt.day() as u8,
                ndt.hour() as u8,
                ndt.minute() as u8,
                ndt.second() as u8,
                dt.timestamp_subsec_micros(),
            )
        }
        Value::Decimal(d) => MyValue::Bytes(d.to_string().into_bytes()),
    }
}

/// Positional parameters for one statement.
pub fn to_params(args: &[Value]) -> Params {
    if args.is_empty() {
        Params::Empty
    } else {
        Params::Positional(args.iter().map(to_mysql_value).collect())
    }
}
