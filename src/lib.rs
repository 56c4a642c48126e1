pub mod error;
pub mod executor;
pub mod models;
pub mod tpl;
pub mod transaction;
pub mod udbc;
#[cfg(feature = "mysql")]
pub mod udbc_mysql;

/// Everything a typical caller needs in one import.
pub mod prelude {
    pub use crate::args;
    pub use crate::error::DbError;
    pub use crate::executor::{
        DebugRecorder, ExecContext, delete_kv, exec_batch_insert, exec_for_count,
        exec_for_last_insert_id, get_one, get_one_row, select_many, select_rows, update_kv,
    };
    pub use crate::models::db_config::DbOptions;
    pub use crate::models::dialect::Dialect;
    pub use crate::transaction::{TransactionContext, transaction};
    pub use crate::udbc::connection::{ExecResult, Executor, Transaction};
    pub use crate::udbc::deserializer::from_row;
    pub use crate::udbc::driver::Driver;
    pub use crate::udbc::serializer::to_args;
    pub use crate::udbc::value::{Arg, ArgMap, Row, Value};
    #[cfg(feature = "mysql")]
    pub use crate::udbc_mysql::pool::MysqlPool;
}
