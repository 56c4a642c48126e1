use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A single bindable scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    Decimal(Decimal),
}

/// An argument as supplied by the caller: one scalar, or an ordered collection
/// that expands into an `IN (...)` list.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Scalar(Value),
    List(Vec<Value>),
}

/// Placeholder name to argument.
pub type ArgMap = BTreeMap<String, Arg>;

/// One fetched row, column name to value.
pub type Row = HashMap<String, Value>;

/// Literal form used for human-readable statement logging.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bytes(b) => {
                f.write_str("X'")?;
                for byte in b {
                    write!(f, "{:02X}", byte)?;
                }
                f.write_str("'")
            }
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::DateTimeUtc(dt) => write!(f, "{}", dt),
            Value::Decimal(d) => write!(f, "{}", d),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($t:ty => |$v:ident| $e:expr),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from($v: $t) -> Self {
                    $e
                }
            }

            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Scalar(Value::from(v))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => |v| Value::Bool(v),
    i8 => |v| Value::Int(v as i64),
    i16 => |v| Value::Int(v as i64),
    i32 => |v| Value::Int(v as i64),
    i64 => |v| Value::Int(v),
    isize => |v| Value::Int(v as i64),
    u8 => |v| Value::UInt(v as u64),
    u16 => |v| Value::UInt(v as u64),
    u32 => |v| Value::UInt(v as u64),
    u64 => |v| Value::UInt(v),
    usize => |v| Value::UInt(v as u64),
    f32 => |v| Value::Float(v as f64),
    f64 => |v| Value::Float(v),
    String => |v| Value::Str(v),
    &str => |v| Value::Str(v.to_string()),
    &String => |v| Value::Str(v.clone()),
    NaiveDate => |v| Value::Date(v),
    NaiveTime => |v| Value::Time(v),
    NaiveDateTime => |v| Value::DateTime(v),
    DateTime<Utc> => |v| Value::DateTimeUtc(v),
    Decimal => |v| Value::Decimal(v),
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Scalar(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Arg::Scalar(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Arg {
    fn from(v: Vec<T>) -> Self {
        Arg::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Arg {
    fn from(v: &[T]) -> Self {
        Arg::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Arg {
    fn from(v: [T; N]) -> Self {
        Arg::List(v.into_iter().map(Into::into).collect())
    }
}

/// Builds an [`ArgMap`].
///
/// ```
/// use namedsql::args;
/// let args = args! { "status" => 1, "ids" => vec![1, 2, 3] };
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::udbc::value::ArgMap::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::udbc::value::ArgMap::new();
        $(
            map.insert(::std::string::ToString::to_string(&$name), $crate::udbc::value::Arg::from($value));
        )+
        map
    }};
}
