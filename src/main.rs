use namedsql::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Deserialize, Debug)]
struct App {
    id: i64,
    name: String,
}

#[derive(Serialize)]
struct Rename<'a> {
    name: &'a str,
    ids: Vec<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::var("DATABASE_URL")?;
    let show_sql = std::env::var("SHOW_SQL").is_ok_and(|v| v == "1" || v == "true");
    let pool = MysqlPool::connect(&DbOptions::new(url).show_sql(show_sql)).await?;
    let ctx = ExecContext::new().with_timeout(Duration::from_secs(10));

    let renamed = exec_for_count(
        &ctx,
        &pool,
        "UPDATE app SET name = :name WHERE id IN (:ids)",
        &to_args(&Rename {
            name: "demo",
            ids: vec![1, 2, 3],
        })?,
    )
    .await?;
    info!("renamed {} apps", renamed);

    let disabled = update_kv(
        &ctx,
        &pool,
        "app",
        &args! { "status" => 0 },
        &["status"],
        &[Arg::from(1)],
    )
    .await?;
    info!("disabled {} apps", disabled);

    let apps: Vec<App> = select_many(
        &ctx,
        &pool,
        "SELECT id, name FROM app LIMIT :n",
        &args! { "n" => 10 },
    )
    .await?;
    for app in &apps {
        info!("app {} = {}", app.id, app.name);
    }

    let moved = transaction(&ctx, &pool, |ctx, tx| {
        Box::pin(async move {
            let n = exec_for_count(
                ctx,
                tx,
                "UPDATE app SET status = 2 WHERE status = :s",
                &args! { "s" => 0 },
            )
            .await?;
            exec_for_count(ctx, tx, "DELETE FROM app WHERE status = :s", &args! { "s" => 3 })
                .await?;
            Ok(n)
        })
    })
    .await?;
    info!("moved {} apps in one transaction", moved);

    for (sql, count) in pool.debug_recorder().counts() {
        info!("{} x{}", sql, count);
    }
    pool.close().await?;
    Ok(())
}
