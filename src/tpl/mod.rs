mod cache;
pub(crate) mod engine;
mod parser;

pub use engine::{BATCH_ROWS_MARKER, BoundQuery, bind_named, expand_batch};

/// A parsed query template: literal SQL text interleaved with `:name` references.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Param(String),
}
