use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Row as MyRow};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::error::DbError;
use crate::executor::recorder::DebugRecorder;
use crate::models::dialect::Dialect;
use crate::udbc::connection::{ExecResult, Executor, Transaction};
use crate::udbc::value::{Row, Value};
use crate::udbc_mysql::value_codec::{from_mysql_column, to_params};

pub(crate) fn map_row(row: MyRow) -> Row {
    let mut out = Row::with_capacity(row.len());
    let cols = row.columns_ref();
    for i in 0..row.len() {
        let col = cols.get(i);
        let v = match (row.as_ref(i), col) {
            (Some(v), Some(c)) => from_mysql_column(v, c.column_type()),
            _ => Value::Null,
        };
        let name = col
            .map(|c| c.name_str().to_string())
            .unwrap_or_else(|| i.to_string());
        out.insert(name, v);
    }
    out
}

pub(crate) async fn exec_on(
    conn: &mut Conn,
    sql: &str,
    args: &[Value],
) -> Result<ExecResult, DbError> {
    conn.exec_drop(sql, to_params(args)).await?;
    Ok(ExecResult {
        rows_affected: conn.affected_rows(),
        last_insert_id: conn.last_insert_id().unwrap_or(0),
    })
}

pub(crate) async fn fetch_one_on(
    conn: &mut Conn,
    sql: &str,
    args: &[Value],
) -> Result<Option<Row>, DbError> {
    let row: Option<MyRow> = conn.exec_first(sql, to_params(args)).await?;
    Ok(row.map(map_row))
}

pub(crate) async fn fetch_all_on(
    conn: &mut Conn,
    sql: &str,
    args: &[Value],
) -> Result<Vec<Row>, DbError> {
    let rows: Vec<MyRow> = conn.exec(sql, to_params(args)).await?;
    Ok(rows.into_iter().map(map_row).collect())
}

/// A transaction pinned to one pooled connection. The connection goes back to
/// the pool when this value is dropped.
pub struct MysqlTransaction {
    conn: Mutex<Conn>,
    recorder: Arc<DebugRecorder>,
    done: AtomicBool,
}

impl MysqlTransaction {
    pub(crate) async fn start(
        mut conn: Conn,
        recorder: Arc<DebugRecorder>,
    ) -> Result<Self, DbError> {
        conn.query_drop("START TRANSACTION").await?;
        Ok(Self {
            conn: Mutex::new(conn),
            recorder,
            done: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.done.load(Ordering::Acquire) {
            return Err(DbError::Transaction("transaction already completed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for MysqlTransaction {
    fn dialect(&self) -> Dialect {
        Dialect::Question
    }

    fn recorder(&self) -> &DebugRecorder {
        &self.recorder
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DbError> {
        self.ensure_open()?;
        exec_on(&mut *self.conn.lock().await, sql, args).await
    }

    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Option<Row>, DbError> {
        self.ensure_open()?;
        fetch_one_on(&mut *self.conn.lock().await, sql, args).await
    }

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DbError> {
        self.ensure_open()?;
        fetch_all_on(&mut *self.conn.lock().await, sql, args).await
    }
}

#[async_trait]
impl Transaction for MysqlTransaction {
    fn as_executor(&self) -> &dyn Executor {
        self
    }

    async fn commit(&self) -> Result<(), DbError> {
        self.ensure_open()?;
        self.conn.lock().await.query_drop("COMMIT").await?;
        self.done.store(true, Ordering::Release);
        Ok(())
    }

    /// No-op once the transaction has completed.
    async fn rollback(&self) -> Result<(), DbError> {
        if self.done.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.conn.lock().await.query_drop("ROLLBACK").await?;
        Ok(())
    }
}
