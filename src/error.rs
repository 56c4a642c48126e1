use thiserror::Error;

/// Errors raised by the query layer.
#[derive(Error, Debug)]
pub enum DbError {
    /// Malformed key/value input, detected before anything is bound.
    #[error("Parameter error: {0}")]
    Parameter(String),
    /// Named placeholder resolution or collection expansion failed.
    #[error("Binding error: {0}")]
    Binding(String),
    #[error("Driver error: {0}")]
    Driver(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Transaction error: {0}")]
    Transaction(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Deadline exceeded")]
    DeadlineExceeded,
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
}

impl DbError {
    /// True when the error came from the execution context rather than the database.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DbError::Cancelled | DbError::DeadlineExceeded)
    }
}

impl serde::de::Error for DbError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        DbError::Decode(msg.to_string())
    }
}

impl serde::ser::Error for DbError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        DbError::Binding(msg.to_string())
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for DbError {
    fn from(e: mysql_async::Error) -> Self {
        match e {
            mysql_async::Error::Io(_) => DbError::Connection(e.to_string()),
            mysql_async::Error::Url(_) => DbError::InvalidDatabaseUrl(e.to_string()),
            _ => DbError::Driver(e.to_string()),
        }
    }
}
