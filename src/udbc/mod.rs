pub mod value;

pub mod connection;
pub mod deserializer;
pub mod driver;
pub mod serializer;

#[cfg(test)]
pub(crate) mod mock;
