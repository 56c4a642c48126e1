//! In-memory executor and driver for unit tests.

use crate::error::DbError;
use crate::executor::recorder::DebugRecorder;
use crate::models::dialect::Dialect;
use crate::udbc::connection::{ExecResult, Executor, Transaction};
use crate::udbc::driver::Driver;
use crate::udbc::value::{Row, Value};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) type Call = (String, Vec<Value>);

/// Records every statement and answers with canned rows.
pub(crate) struct MockExecutor {
    pub dialect: Dialect,
    pub recorder: DebugRecorder,
    pub rows: Vec<Row>,
    pub result: ExecResult,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            dialect: Dialect::Question,
            recorder: DebugRecorder::new(true),
            rows: Vec::new(),
            result: ExecResult::default(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_result(mut self, rows_affected: u64, last_insert_id: u64) -> Self {
        self.result = ExecResult {
            rows_affected,
            last_insert_id,
        };
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn log(&self, sql: &str, args: &[Value]) {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl Executor for MockExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn recorder(&self) -> &DebugRecorder {
        &self.recorder
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DbError> {
        self.log(sql, args).await;
        Ok(self.result)
    }

    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Option<Row>, DbError> {
        self.log(sql, args).await;
        Ok(self.rows.first().cloned())
    }

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DbError> {
        self.log(sql, args).await;
        Ok(self.rows.clone())
    }
}

/// Shared bookkeeping for [`MockDriver`] and its transactions.
#[derive(Default)]
pub(crate) struct MockState {
    pub committed: Mutex<Vec<Call>>,
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub fail_commit: bool,
}

impl MockState {
    pub fn committed_sql(&self) -> Vec<String> {
        self.committed
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }
}

pub(crate) struct MockDriver {
    pub state: Arc<MockState>,
    recorder: DebugRecorder,
}

impl MockDriver {
    pub fn new(state: Arc<MockState>) -> Self {
        Self {
            state,
            recorder: DebugRecorder::new(true),
        }
    }
}

#[async_trait]
impl Executor for MockDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Question
    }

    fn recorder(&self) -> &DebugRecorder {
        &self.recorder
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DbError> {
        self.state
            .committed
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: 0,
        })
    }

    async fn fetch_one(&self, _sql: &str, _args: &[Value]) -> Result<Option<Row>, DbError> {
        Ok(None)
    }

    async fn fetch_all(&self, _sql: &str, _args: &[Value]) -> Result<Vec<Row>, DbError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError> {
        self.state.begins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransaction {
            state: self.state.clone(),
            pending: Mutex::new(Vec::new()),
            recorder: DebugRecorder::new(true),
        }))
    }

    async fn close(&self) -> Result<(), DbError> {
        Ok(())
    }
}

/// Buffers writes until commit.
pub(crate) struct MockTransaction {
    state: Arc<MockState>,
    pending: Mutex<Vec<Call>>,
    recorder: DebugRecorder,
}

#[async_trait]
impl Executor for MockTransaction {
    fn dialect(&self) -> Dialect {
        Dialect::Question
    }

    fn recorder(&self) -> &DebugRecorder {
        &self.recorder
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DbError> {
        self.pending
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: 0,
        })
    }

    async fn fetch_one(&self, _sql: &str, _args: &[Value]) -> Result<Option<Row>, DbError> {
        Ok(None)
    }

    async fn fetch_all(&self, _sql: &str, _args: &[Value]) -> Result<Vec<Row>, DbError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl Transaction for MockTransaction {
    fn as_executor(&self) -> &dyn Executor {
        self
    }

    async fn commit(&self) -> Result<(), DbError> {
        if self.state.fail_commit {
            return Err(DbError::Driver("commit refused".into()));
        }
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        self.state.committed.lock().unwrap().extend(pending);
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        self.pending.lock().unwrap().clear();
        self.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
