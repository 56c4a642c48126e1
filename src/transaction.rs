use crate::error::DbError;
use crate::executor::context::ExecContext;
use crate::udbc::connection::{Executor, Transaction};
use crate::udbc::driver::Driver;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

/// Owns an open transaction. Rolls back on drop unless it was completed.
pub struct TransactionContext {
    tx: Option<Box<dyn Transaction>>,
}

impl TransactionContext {
    pub async fn begin<D>(ctx: &ExecContext, driver: &D) -> Result<Self, DbError>
    where
        D: Driver + ?Sized,
    {
        let tx = ctx.run(driver.begin()).await?;
        Ok(Self { tx: Some(tx) })
    }

    pub fn executor(&self) -> Result<&dyn Executor, DbError> {
        self.tx
            .as_deref()
            .map(|tx| tx.as_executor())
            .ok_or_else(|| DbError::Transaction("transaction already completed".into()))
    }

    /// Commits. On failure the transaction is rolled back before the commit
    /// error is returned.
    pub async fn commit(mut self) -> Result<(), DbError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::Transaction("transaction already completed".into()))?;
        if let Err(e) = tx.commit().await {
            if let Err(rb) = tx.rollback().await {
                warn!("rollback after failed commit: {}", rb);
            }
            return Err(e);
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), DbError> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await,
            None => Ok(()),
        }
    }
}

impl Drop for TransactionContext {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = tx.rollback().await {
                            warn!("rollback of abandoned transaction: {}", e);
                        }
                    });
                }
                Err(_) => warn!("transaction dropped outside a runtime, not rolled back"),
            }
        }
    }
}

/// Runs `f` inside a transaction: commit when it returns `Ok`, rollback when it
/// returns `Err` or panics. The error (or panic) from `f` is passed through.
///
/// ```no_run
/// # use namedsql::prelude::*;
/// # async fn demo(pool: &namedsql::udbc_mysql::pool::MysqlPool) -> Result<(), DbError> {
/// let ctx = ExecContext::new();
/// transaction(&ctx, pool, |ctx, tx| {
///     Box::pin(async move {
///         let debit = "UPDATE acct SET bal = bal - 1 WHERE id = :id";
///         let credit = "UPDATE acct SET bal = bal + 1 WHERE id = :id";
///         exec_for_count(ctx, tx, debit, &args! { "id" => 1 }).await?;
///         exec_for_count(ctx, tx, credit, &args! { "id" => 2 }).await?;
///         Ok(())
///     })
/// })
/// .await
/// # }
/// ```
pub async fn transaction<D, T, F>(ctx: &ExecContext, driver: &D, f: F) -> Result<T, DbError>
where
    D: Driver + ?Sized,
    F: for<'t> FnOnce(&'t ExecContext, &'t dyn Executor) -> BoxFuture<'t, Result<T, DbError>>,
{
    let tx = TransactionContext::begin(ctx, driver).await?;

    let outcome = {
        let exec = tx.executor()?;
        AssertUnwindSafe(f(ctx, exec)).catch_unwind().await
    };

    match outcome {
        Ok(Ok(value)) => {
            tx.commit().await?;
            debug!("transaction committed");
            Ok(value)
        }
        Ok(Err(e)) => {
            debug!("transaction rolled back: {}", e);
            if let Err(rb) = tx.rollback().await {
                warn!("rollback failed: {}", rb);
            }
            Err(e)
        }
        Err(panic) => {
            warn!("transaction rolled back after panic");
            if let Err(rb) = tx.rollback().await {
                warn!("rollback failed: {}", rb);
            }
            std::panic::resume_unwind(panic)
        }
    }
}
