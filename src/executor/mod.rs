//! Query execution over any [`Executor`](crate::udbc::connection::Executor).

pub mod context;
pub mod kv;
pub mod query;
pub mod recorder;

pub use context::ExecContext;
pub use kv::{KvStatement, build_delete, build_update, delete_kv, update_kv};
pub use query::{
    exec_batch_insert, exec_for_count, exec_for_last_insert_id, get_one, get_one_row, select_many,
    select_rows,
};
pub use recorder::DebugRecorder;
