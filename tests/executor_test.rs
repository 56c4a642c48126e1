use async_trait::async_trait;
use namedsql::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Postgres-style executor that keeps every statement it receives.
struct Recording {
    recorder: DebugRecorder,
    rows: Vec<Row>,
    seen: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Recording {
    fn new(rows: Vec<Row>) -> Self {
        Self {
            recorder: DebugRecorder::new(true),
            rows,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<(String, Vec<Value>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for Recording {
    fn dialect(&self) -> Dialect {
        Dialect::Dollar
    }

    fn recorder(&self) -> &DebugRecorder {
        &self.recorder
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DbError> {
        self.seen.lock().unwrap().push((sql.to_string(), args.to_vec()));
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: 0,
        })
    }

    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Option<Row>, DbError> {
        self.seen.lock().unwrap().push((sql.to_string(), args.to_vec()));
        Ok(self.rows.first().cloned())
    }

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DbError> {
        self.seen.lock().unwrap().push((sql.to_string(), args.to_vec()));
        Ok(self.rows.clone())
    }
}

#[derive(Serialize)]
struct Search<'a> {
    kind: &'a str,
    ids: Vec<u32>,
}

#[derive(Deserialize, Debug, PartialEq)]
struct Item {
    id: i64,
    label: Option<String>,
}

#[tokio::test]
async fn test_struct_args_expand_and_rebind() {
    let exec = Recording::new(Vec::new());
    let args = to_args(&Search {
        kind: "book",
        ids: vec![4, 5],
    })
    .unwrap();
    select_rows(
        &ExecContext::new(),
        &exec,
        "SELECT * FROM item WHERE kind = :kind AND note <> ':kind' AND id IN (:ids)",
        &args,
    )
    .await
    .unwrap();

    let seen = exec.seen();
    assert_eq!(
        seen[0].0,
        "SELECT * FROM item WHERE kind = $1 AND note <> ':kind' AND id IN ($2, $3)"
    );
    assert_eq!(
        seen[0].1,
        vec![Value::Str("book".into()), Value::UInt(4), Value::UInt(5)]
    );
}

#[tokio::test]
async fn test_rows_decode_with_nulls() {
    let mut row = HashMap::new();
    row.insert("id".to_string(), Value::Int(9));
    row.insert("label".to_string(), Value::Null);
    let exec = Recording::new(vec![row]);

    let item: Option<Item> = get_one(
        &ExecContext::new(),
        &exec,
        "SELECT id, label FROM item WHERE id = :id",
        &args! { "id" => 9 },
    )
    .await
    .unwrap();
    assert_eq!(item, Some(Item { id: 9, label: None }));
}

#[tokio::test]
async fn test_recorder_counts_per_statement() {
    let exec = Recording::new(Vec::new());
    let ctx = ExecContext::new();
    for id in [1, 2, 3] {
        delete_kv(&ctx, &exec, "item", &["id"], &[Arg::from(id)])
            .await
            .unwrap();
    }
    let key = "DELETE FROM item WHERE id = $1";
    assert_eq!(exec.recorder.count(key), 3);
    assert_eq!(
        exec.recorder.statement(key).as_deref(),
        Some("DELETE FROM item WHERE id = 3;")
    );
}

#[tokio::test]
async fn test_batch_insert_through_dialect() {
    let exec = Recording::new(Vec::new());
    let rows = vec![
        vec![Value::from(1), Value::from("a")],
        vec![Value::from(2), Value::from("b")],
    ];
    exec_batch_insert(
        &ExecContext::new(),
        &exec,
        "INSERT INTO item (id, label) VALUES {rows}",
        &rows,
        &ArgMap::new(),
    )
    .await
    .unwrap();
    assert_eq!(
        exec.seen()[0].0,
        "INSERT INTO item (id, label) VALUES ($1, $2),($3, $4)"
    );
}

#[tokio::test]
async fn test_already_cancelled_context_issues_nothing() {
    let exec = Recording::new(Vec::new());
    let ctx = ExecContext::new();
    ctx.cancel();
    let err = exec_for_count(&ctx, &exec, "DELETE FROM item", &args! {})
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Cancelled));
    assert!(exec.seen().is_empty());
}
