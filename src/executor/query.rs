use crate::error::DbError;
use crate::executor::context::ExecContext;
use crate::tpl::{self, BoundQuery};
use crate::udbc::connection::{ExecResult, Executor};
use crate::udbc::deserializer::from_row;
use crate::udbc::value::{ArgMap, Row, Value};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::debug;

/// Binds `template`, rewrites it for the executor's dialect and records it.
/// Returns the dialect statement and its positional arguments.
fn prepare<E>(exec: &E, template: &str, args: &ArgMap) -> Result<(String, Vec<Value>), DbError>
where
    E: Executor + ?Sized,
{
    let bound = tpl::bind_named(template, args)?;
    let sql = exec.rebind(&bound.sql);
    exec.recorder().record(&sql, &bound);
    let BoundQuery { args, .. } = bound;
    Ok((sql, args))
}

async fn execute<E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    args: &ArgMap,
) -> Result<ExecResult, DbError>
where
    E: Executor + ?Sized,
{
    let (sql, params) = prepare(exec, template, args)?;
    let start = Instant::now();
    let result = ctx.run(exec.execute(&sql, &params)).await;
    let elapsed_ms = start.elapsed().as_millis();
    match &result {
        Ok(r) => debug!(
            "execute: sql={}, elapsed_ms={}, affected={}, last_insert_id={}",
            sql, elapsed_ms, r.rows_affected, r.last_insert_id
        ),
        Err(e) => debug!("execute: sql={}, elapsed_ms={}, error={}", sql, elapsed_ms, e),
    }
    result
}

/// Runs an UPDATE/DELETE style statement and returns the affected row count.
pub async fn exec_for_count<E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    args: &ArgMap,
) -> Result<u64, DbError>
where
    E: Executor + ?Sized,
{
    Ok(execute(ctx, exec, template, args).await?.rows_affected)
}

/// Runs a single-row INSERT and returns the generated identifier.
pub async fn exec_for_last_insert_id<E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    args: &ArgMap,
) -> Result<u64, DbError>
where
    E: Executor + ?Sized,
{
    Ok(execute(ctx, exec, template, args).await?.last_insert_id)
}

/// Inserts every row of `rows` in one statement.
///
/// `template` carries one [`tpl::BATCH_ROWS_MARKER`], e.g.
/// `INSERT INTO t (a, b) VALUES {rows}`; it becomes `(?, ?),(?, ?),...`, one
/// group per row. `args` supplies any other named placeholders.
pub async fn exec_batch_insert<E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    rows: &[Vec<Value>],
    args: &ArgMap,
) -> Result<u64, DbError>
where
    E: Executor + ?Sized,
{
    let mut args = args.clone();
    let expanded = tpl::expand_batch(template, rows, &mut args)?;
    exec_for_count(ctx, exec, &expanded, &args).await
}

/// Fetches at most one row; `Ok(None)` when nothing matched.
pub async fn get_one_row<E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    args: &ArgMap,
) -> Result<Option<Row>, DbError>
where
    E: Executor + ?Sized,
{
    let (sql, params) = prepare(exec, template, args)?;
    let start = Instant::now();
    let row = ctx.run(exec.fetch_one(&sql, &params)).await?;
    debug!(
        "get: sql={}, elapsed_ms={}, found={}",
        sql,
        start.elapsed().as_millis(),
        row.is_some()
    );
    Ok(row)
}

/// Fetches one row into `R`. A query matching nothing is `Ok(None)`, not an error.
pub async fn get_one<R, E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    args: &ArgMap,
) -> Result<Option<R>, DbError>
where
    R: DeserializeOwned,
    E: Executor + ?Sized,
{
    get_one_row(ctx, exec, template, args)
        .await?
        .map(|row| from_row(&row))
        .transpose()
}

pub async fn select_rows<E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    args: &ArgMap,
) -> Result<Vec<Row>, DbError>
where
    E: Executor + ?Sized,
{
    let (sql, params) = prepare(exec, template, args)?;
    let start = Instant::now();
    let rows = ctx.run(exec.fetch_all(&sql, &params)).await?;
    debug!(
        "select: sql={}, elapsed_ms={}, rows={}",
        sql,
        start.elapsed().as_millis(),
        rows.len()
    );
    Ok(rows)
}

/// Fetches every matching row into `R`; no match yields an empty vector.
pub async fn select_many<R, E>(
    ctx: &ExecContext,
    exec: &E,
    template: &str,
    args: &ArgMap,
) -> Result<Vec<R>, DbError>
where
    R: DeserializeOwned,
    E: Executor + ?Sized,
{
    select_rows(ctx, exec, template, args)
        .await?
        .iter()
        .map(from_row::<R>)
        .collect()
}
