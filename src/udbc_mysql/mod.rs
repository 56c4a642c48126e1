pub mod connection;
pub mod pool;
pub mod value_codec;
