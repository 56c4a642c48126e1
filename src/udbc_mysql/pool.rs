use crate::error::DbError;
use crate::executor::recorder::DebugRecorder;
use crate::models::db_config::DbOptions;
use crate::models::dialect::Dialect;
use crate::udbc::connection::{ExecResult, Executor, Transaction};
use crate::udbc::driver::Driver;
use crate::udbc::value::{Row, Value};
use crate::udbc_mysql::connection::{MysqlTransaction, exec_on, fetch_all_on, fetch_one_on};
use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};
use std::sync::Arc;
use tracing::info;

/// A MySQL connection pool. Every statement borrows a connection for its own
/// duration; transactions hold one until they complete.
pub struct MysqlPool {
    pool: Pool,
    recorder: Arc<DebugRecorder>,
}

impl MysqlPool {
    /// Opens the pool and pings the server once. Any failure here is returned
    /// to the caller.
    pub async fn connect(options: &DbOptions) -> Result<Self, DbError> {
        let opts = Opts::from_url(&options.url)
            .map_err(|e| DbError::InvalidDatabaseUrl(e.to_string()))?;

        let max = options.max_open_conns.max(1);
        let constraints = PoolConstraints::new(options.max_idle_conns.min(max), max)
            .ok_or_else(|| DbError::Connection("invalid pool constraints: min > max".into()))?;
        let mut pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_abs_conn_ttl(Some(options.max_lifetime));
        if let Some(ttl) = options.inactive_ttl {
            pool_opts = pool_opts.with_inactive_connection_ttl(ttl);
        }

        let pool = Pool::new(OptsBuilder::from_opts(opts).pool_opts(pool_opts));
        let mut conn = pool
            .get_conn()
            .await
            .map_err(|e| DbError::Connection(format!("db connect error: {}", e)))?;
        conn.ping()
            .await
            .map_err(|e| DbError::Connection(format!("db ping error: {}", e)))?;
        drop(conn);

        info!(
            "mysql pool ready: max_open_conns={}, max_idle_conns={}, show_sql={}",
            max, options.max_idle_conns, options.show_sql
        );
        Ok(Self {
            pool,
            recorder: Arc::new(DebugRecorder::new(options.show_sql)),
        })
    }

    /// Shared handle to the recorder, also used by transactions from this pool.
    pub fn debug_recorder(&self) -> Arc<DebugRecorder> {
        self.recorder.clone()
    }

    async fn conn(&self) -> Result<Conn, DbError> {
        Ok(self.pool.get_conn().await?)
    }
}

#[async_trait]
impl Executor for MysqlPool {
    fn dialect(&self) -> Dialect {
        Dialect::Question
    }

    fn recorder(&self) -> &DebugRecorder {
        &self.recorder
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DbError> {
        exec_on(&mut self.conn().await?, sql, args).await
    }

    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Option<Row>, DbError> {
        fetch_one_on(&mut self.conn().await?, sql, args).await
    }

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DbError> {
        fetch_all_on(&mut self.conn().await?, sql, args).await
    }
}

#[async_trait]
impl Driver for MysqlPool {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError> {
        let conn = self.conn().await?;
        let tx = MysqlTransaction::start(conn, self.recorder.clone()).await?;
        Ok(Box::new(tx))
    }

    async fn close(&self) -> Result<(), DbError> {
        self.pool.clone().disconnect().await?;
        info!("mysql pool closed");
        Ok(())
    }
}
