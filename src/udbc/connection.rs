use crate::error::DbError;
use crate::executor::recorder::DebugRecorder;
use crate::models::dialect::Dialect;
use crate::udbc::value::{Row, Value};
use async_trait::async_trait;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Zero when the statement generated no identifier.
    pub last_insert_id: u64,
}

/// Anything that can run positional-placeholder statements: a pool or an open
/// transaction. The query functions are written once against this trait.
#[async_trait]
pub trait Executor: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Rewrites `?` placeholders into this executor's dialect.
    fn rebind(&self, query: &str) -> String {
        self.dialect().rebind(query)
    }

    fn recorder(&self) -> &DebugRecorder;

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DbError>;

    /// First row of the result, `None` when the query matched nothing.
    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Option<Row>, DbError>;

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DbError>;
}

/// An in-flight transaction. Completes exactly once, by commit or rollback.
#[async_trait]
pub trait Transaction: Executor {
    fn as_executor(&self) -> &dyn Executor;

    async fn commit(&self) -> Result<(), DbError>;

    async fn rollback(&self) -> Result<(), DbError>;
}
