use crate::error::DbError;
use crate::udbc::value::{Arg, ArgMap, Value};
use serde::Serialize;
use serde::ser::*;

/// Intermediate form of a serialized value.
enum Node {
    Scalar(Value),
    List(Vec<Value>),
    Map(ArgMap),
}

struct NodeSerializer;

impl Serializer for NodeSerializer {
    type Ok = Node;
    type Error = DbError;
    type SerializeSeq = ListSerializer;
    type SerializeTuple = ListSerializer;
    type SerializeTupleStruct = ListSerializer;
    type SerializeTupleVariant = ListSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = MapSerializer;
    type SerializeStructVariant = MapSerializer;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Bool(v)))
    }
    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Int(v as i64)))
    }
    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Int(v as i64)))
    }
    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Int(v as i64)))
    }
    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Int(v)))
    }
    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::UInt(v as u64)))
    }
    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::UInt(v as u64)))
    }
    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::UInt(v as u64)))
    }
    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::UInt(v)))
    }
    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Float(v as f64)))
    }
    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Float(v)))
    }
    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Str(v.to_string())))
    }
    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Str(v.to_string())))
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Bytes(v.to_vec())))
    }
    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Null))
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Null))
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Null))
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Scalar(Value::Str(variant.to_string())))
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }
    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(ListSerializer {
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }
    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        self.serialize_seq(Some(len))
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(MapSerializer {
            map: ArgMap::new(),
            key: None,
        })
    }
    fn serialize_struct(
        self,
        _: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        self.serialize_map(None)
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        self.serialize_map(None)
    }
}

struct ListSerializer {
    vec: Vec<Value>,
}

macro_rules! impl_serialize_seq {
    ($trait:ident, $method:ident) => {
        impl $trait for ListSerializer {
            type Ok = Node;
            type Error = DbError;

            fn $method<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
                match value.serialize(NodeSerializer)? {
                    Node::Scalar(v) => {
                        self.vec.push(v);
                        Ok(())
                    }
                    _ => Err(DbError::Binding(
                        "collection elements must be scalars".into(),
                    )),
                }
            }

            fn end(self) -> Result<Self::Ok, Self::Error> {
                Ok(Node::List(self.vec))
            }
        }
    };
}

impl_serialize_seq!(SerializeSeq, serialize_element);
impl_serialize_seq!(SerializeTuple, serialize_element);
impl_serialize_seq!(SerializeTupleStruct, serialize_field);
impl_serialize_seq!(SerializeTupleVariant, serialize_field);

struct MapSerializer {
    map: ArgMap,
    key: Option<String>,
}

impl MapSerializer {
    fn insert<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> Result<(), DbError> {
        let arg = match value.serialize(NodeSerializer)? {
            Node::Scalar(v) => Arg::Scalar(v),
            Node::List(items) => Arg::List(items),
            Node::Map(_) => {
                return Err(DbError::Binding(format!(
                    "argument `{}` is a nested map or struct",
                    key
                )));
            }
        };
        self.map.insert(key, arg);
        Ok(())
    }
}

impl SerializeMap for MapSerializer {
    type Ok = Node;
    type Error = DbError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        match key.serialize(NodeSerializer)? {
            Node::Scalar(Value::Str(s)) => {
                self.key = Some(s);
                Ok(())
            }
            _ => Err(DbError::Binding("argument names must be strings".into())),
        }
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .key
            .take()
            .ok_or_else(|| DbError::Binding("missing key for value".into()))?;
        self.insert(key, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Node::Map(self.map))
    }
}

macro_rules! impl_serialize_struct {
    ($trait:ident) => {
        impl $trait for MapSerializer {
            type Ok = Node;
            type Error = DbError;

            fn serialize_field<T: ?Sized + Serialize>(
                &mut self,
                key: &'static str,
                value: &T,
            ) -> Result<(), Self::Error> {
                self.insert(key.to_string(), value)
            }

            fn end(self) -> Result<Self::Ok, Self::Error> {
                Ok(Node::Map(self.map))
            }
        }
    };
}

impl_serialize_struct!(SerializeStruct);
impl_serialize_struct!(SerializeStructVariant);

/// Converts a struct or map into named arguments. Sequence fields become
/// collections; nested structs are rejected.
pub fn to_args<T: Serialize + ?Sized>(t: &T) -> Result<ArgMap, DbError> {
    match t.serialize(NodeSerializer)? {
        Node::Map(map) => Ok(map),
        _ => Err(DbError::Binding(
            "named arguments must serialize as a struct or map".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Filter<'a> {
        name: &'a str,
        age: u8,
        ids: Vec<i64>,
        nick: Option<String>,
    }

    #[test]
    fn test_struct_to_args() {
        let args = to_args(&Filter {
            name: "tom",
            age: 18,
            ids: vec![1, 2],
            nick: None,
        })
        .unwrap();
        assert_eq!(args["name"], Arg::Scalar(Value::Str("tom".into())));
        assert_eq!(args["age"], Arg::Scalar(Value::UInt(18)));
        assert_eq!(args["ids"], Arg::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(args["nick"], Arg::Scalar(Value::Null));
    }

    #[test]
    fn test_map_to_args() {
        let mut m = HashMap::new();
        m.insert("status", 3);
        let args = to_args(&m).unwrap();
        assert_eq!(args["status"], Arg::Scalar(Value::Int(3)));
    }

    #[test]
    fn test_rejects_scalars_and_nesting() {
        assert!(to_args(&5).is_err());

        #[derive(Serialize)]
        struct Inner {
            a: i32,
        }
        #[derive(Serialize)]
        struct Outer {
            inner: Inner,
        }
        assert!(matches!(
            to_args(&Outer { inner: Inner { a: 1 } }),
            Err(DbError::Binding(_))
        ));

        #[derive(Serialize)]
        struct Nested {
            grid: Vec<Vec<i32>>,
        }
        assert!(to_args(&Nested { grid: vec![vec![1]] }).is_err());
    }
}
