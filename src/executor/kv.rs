//! UPDATE and DELETE built from a table name, column values and key filters.
//!
//! Values are always bound. Table and column names are written into the SQL as
//! given and must never come from untrusted input.

use crate::error::DbError;
use crate::executor::context::ExecContext;
use crate::executor::query::exec_for_count;
use crate::udbc::connection::Executor;
use crate::udbc::value::{Arg, ArgMap};
use std::collections::HashSet;
use tracing::debug;

/// A generated statement with the arguments its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct KvStatement {
    pub sql: String,
    pub args: ArgMap,
}

/// Hands out placeholder names derived from column names, unique per statement.
#[derive(Default)]
struct Names {
    used: HashSet<String>,
}

impl Names {
    fn claim(&mut self, column: &str) -> String {
        let mut base: String = column
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if base.is_empty() {
            base.push_str("col");
        }
        let mut name = base.clone();
        let mut n = 1;
        while !self.used.insert(name.clone()) {
            n += 1;
            name = format!("{}_{}", base, n);
        }
        name
    }
}

fn check_keys(keys: &[&str], values: &[Arg]) -> Result<(), DbError> {
    if keys.is_empty() {
        return Err(DbError::Parameter("keys len error: no filter keys".into()));
    }
    if keys.len() != values.len() {
        return Err(DbError::Parameter(format!(
            "value len error: {} keys but {} values",
            keys.len(),
            values.len()
        )));
    }
    Ok(())
}

/// Appends `WHERE k1 = :k1 AND k2 IN (:k2)`. Returns `false` when a filter is an
/// empty collection, meaning nothing can match.
fn write_filters(
    sql: &mut String,
    args: &mut ArgMap,
    names: &mut Names,
    keys: &[&str],
    values: &[Arg],
) -> bool {
    sql.push_str(" WHERE ");
    for (i, (key, value)) in keys.iter().zip(values).enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        let name = names.claim(key);
        sql.push_str(key);
        match value {
            Arg::List(items) if items.is_empty() => return false,
            Arg::List(_) => {
                sql.push_str(" IN (:");
                sql.push_str(&name);
                sql.push(')');
            }
            Arg::Scalar(_) => {
                sql.push_str(" = :");
                sql.push_str(&name);
            }
        }
        args.insert(name, value.clone());
    }
    true
}

/// Builds `UPDATE table SET ... WHERE ...`.
///
/// `Ok(None)` when a filter value is an empty collection.
pub fn build_update(
    table: &str,
    updates: &ArgMap,
    keys: &[&str],
    values: &[Arg],
) -> Result<Option<KvStatement>, DbError> {
    check_keys(keys, values)?;
    if updates.is_empty() {
        return Err(DbError::Parameter("no columns to update".into()));
    }

    let mut names = Names::default();
    let mut args = ArgMap::new();
    let mut sql = String::with_capacity(64 + updates.len() * 16);
    sql.push_str("UPDATE ");
    sql.push_str(table);
    sql.push_str(" SET ");
    for (i, (column, value)) in updates.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        let name = names.claim(column);
        sql.push_str(column);
        sql.push_str(" = :");
        sql.push_str(&name);
        args.insert(name, value.clone());
    }

    if !write_filters(&mut sql, &mut args, &mut names, keys, values) {
        return Ok(None);
    }
    Ok(Some(KvStatement { sql, args }))
}

/// Builds `DELETE FROM table WHERE ...`.
///
/// `Ok(None)` when a filter value is an empty collection.
pub fn build_delete(
    table: &str,
    keys: &[&str],
    values: &[Arg],
) -> Result<Option<KvStatement>, DbError> {
    check_keys(keys, values)?;

    let mut names = Names::default();
    let mut args = ArgMap::new();
    let mut sql = String::with_capacity(64);
    sql.push_str("DELETE FROM ");
    sql.push_str(table);

    if !write_filters(&mut sql, &mut args, &mut names, keys, values) {
        return Ok(None);
    }
    Ok(Some(KvStatement { sql, args }))
}

/// Updates `updates` columns of the rows matching every key filter.
///
/// A scalar filter becomes `key = ?`, a collection `key IN (?, ...)`. An empty
/// collection matches nothing, so no statement is issued and `0` is returned.
pub async fn update_kv<E>(
    ctx: &ExecContext,
    exec: &E,
    table: &str,
    updates: &ArgMap,
    keys: &[&str],
    values: &[Arg],
) -> Result<u64, DbError>
where
    E: Executor + ?Sized,
{
    match build_update(table, updates, keys, values)? {
        Some(stmt) => exec_for_count(ctx, exec, &stmt.sql, &stmt.args).await,
        None => {
            debug!("update_kv: empty filter on {}, skipped", table);
            Ok(0)
        }
    }
}

/// Deletes the rows matching every key filter. Same filter rules as [`update_kv`].
pub async fn delete_kv<E>(
    ctx: &ExecContext,
    exec: &E,
    table: &str,
    keys: &[&str],
    values: &[Arg],
) -> Result<u64, DbError>
where
    E: Executor + ?Sized,
{
    match build_delete(table, keys, values)? {
        Some(stmt) => exec_for_count(ctx, exec, &stmt.sql, &stmt.args).await,
        None => {
            debug!("delete_kv: empty filter on {}, skipped", table);
            Ok(0)
        }
    }
}
