use crate::error::DbError;
use crate::udbc::connection::{Executor, Transaction};
use async_trait::async_trait;

/// A connection pool: runs statements directly and hands out transactions.
#[async_trait]
pub trait Driver: Executor {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError>;

    async fn close(&self) -> Result<(), DbError>;
}
