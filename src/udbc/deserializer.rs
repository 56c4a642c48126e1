use crate::error::DbError;
use crate::udbc::value::{Row, Value};
use serde::de::{self, Deserializer, IntoDeserializer, MapAccess, Visitor};

/// Maps one fetched row onto a caller type, column names as field names.
pub struct RowDeserializer<'a> {
    row: &'a Row,
}

impl<'a> RowDeserializer<'a> {
    pub fn new(row: &'a Row) -> Self {
        Self { row }
    }
}

/// Deserializes a row into `R`.
pub fn from_row<R: de::DeserializeOwned>(row: &Row) -> Result<R, DbError> {
    R::deserialize(RowDeserializer::new(row))
}

impl<'de, 'a> Deserializer<'de> for RowDeserializer<'a> {
    type Error = DbError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(RowMapAccess::new(self.row))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string
        unit seq tuple tuple_struct map struct enum identifier ignored_any
        unit_struct newtype_struct bytes byte_buf option
    }
}

struct RowMapAccess<'a> {
    iter: std::collections::hash_map::Iter<'a, String, Value>,
    current: Option<&'a Value>,
}

impl<'a> RowMapAccess<'a> {
    fn new(row: &'a Row) -> Self {
        Self {
            iter: row.iter(),
            current: None,
        }
    }
}

impl<'de, 'a> MapAccess<'de> for RowMapAccess<'a> {
    type Error = DbError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        if let Some((k, v)) = self.iter.next() {
            self.current = Some(v);
            seed.deserialize(k.as_str().into_deserializer()).map(Some)
        } else {
            Ok(None)
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        let value = self
            .current
            .take()
            .ok_or_else(|| DbError::Decode("value requested before key".into()))?;
        seed.deserialize(ValueDeserializer { value })
    }
}

pub struct ValueDeserializer<'a> {
    pub value: &'a Value,
}

impl<'a> ValueDeserializer<'a> {
    /// Text form of the value, for numeric columns delivered as text (DECIMAL).
    fn text(&self) -> Option<&'a str> {
        match self.value {
            Value::Str(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident : $t:ty),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
            where
                V: Visitor<'de>,
            {
                match self.text() {
                    Some(s) => {
                        let n: $t = s.trim().parse().map_err(|_| {
                            DbError::Decode(format!(
                                "cannot parse `{}` as {}",
                                s,
                                stringify!($t)
                            ))
                        })?;
                        visitor.$visit(n)
                    }
                    None => self.deserialize_any(visitor),
                }
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for ValueDeserializer<'a> {
    type Error = DbError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(*v),
            Value::Int(v) => visitor.visit_i64(*v),
            Value::UInt(v) => visitor.visit_u64(*v),
            Value::Float(v) => visitor.visit_f64(*v),
            Value::Str(v) => visitor.visit_str(v),
            Value::Bytes(v) => match std::str::from_utf8(v) {
                Ok(s) => visitor.visit_str(s),
                Err(_) => visitor.visit_bytes(v),
            },
            Value::Date(d) => visitor.visit_string(d.to_string()),
            Value::Time(t) => visitor.visit_string(t.to_string()),
            Value::DateTime(dt) => visitor.visit_string(format!("{:?}", dt)),
            Value::DateTimeUtc(dt) => visitor.visit_string(dt.to_rfc3339()),
            Value::Decimal(d) => visitor.visit_string(d.to_string()),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Int(v) => visitor.visit_bool(*v != 0),
            Value::UInt(v) => visitor.visit_bool(*v != 0),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Bytes(v) => visitor.visit_bytes(v),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    deserialize_number! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    serde::forward_to_deserialize_any! {
        char str string unit seq tuple tuple_struct map struct enum identifier
        unit_struct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udbc::mock::row;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde::Deserialize;
    use std::str::FromStr;

    #[derive(Deserialize, Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
        nick: Option<String>,
        active: bool,
        score: f64,
    }

    #[test]
    fn test_row_to_struct() {
        let r = row(&[
            ("id", Value::Int(9)),
            ("name", Value::Bytes(b"tom".to_vec())),
            ("nick", Value::Null),
            ("active", Value::Int(1)),
            ("score", Value::Bytes(b"12.50".to_vec())),
            ("extra", Value::Str("ignored".into())),
        ]);
        let user: User = from_row(&r).unwrap();
        assert_eq!(
            user,
            User {
                id: 9,
                name: "tom".into(),
                nick: None,
                active: true,
                score: 12.5,
            }
        );
    }

    #[derive(Deserialize, Debug)]
    struct Stamped {
        created: chrono::NaiveDateTime,
        day: NaiveDate,
        amount: Decimal,
        nick: Option<String>,
    }

    #[test]
    fn test_temporal_and_decimal() {
        let created = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let r = row(&[
            ("created", Value::DateTime(created)),
            ("day", Value::Date(created.date())),
            ("amount", Value::Decimal(Decimal::from_str("3.14").unwrap())),
            ("nick", Value::Str("t".into())),
        ]);
        let s: Stamped = from_row(&r).unwrap();
        assert_eq!(s.created, created);
        assert_eq!(s.day, created.date());
        assert_eq!(s.amount, Decimal::from_str("3.14").unwrap());
        assert_eq!(s.nick.as_deref(), Some("t"));
    }

    #[test]
    fn test_bad_number_is_decode_error() {
        #[derive(Deserialize, Debug)]
        struct N {
            #[allow(dead_code)]
            n: i32,
        }
        let r = row(&[("n", Value::Str("abc".into()))]);
        let err = from_row::<N>(&r).unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }
}
