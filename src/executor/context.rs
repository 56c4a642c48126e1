use crate::error::DbError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried through every query call.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecContext {
    /// A context that never cancels on its own.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Same cancellation source, with a deadline `timeout` from now. An earlier
    /// existing deadline is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.clone(),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    /// A context cancelled together with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Checks the context without waiting.
    pub fn check(&self) -> Result<(), DbError> {
        if self.token.is_cancelled() {
            return Err(DbError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(DbError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drives `fut` until it completes, the context is cancelled, or the
    /// deadline passes. The in-flight future is dropped in the latter two cases.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        self.check()?;
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(DbError::Cancelled),
                res = fut => res,
            }
        };
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| DbError::DeadlineExceeded)?,
            None => guarded.await,
        }
    }
}
