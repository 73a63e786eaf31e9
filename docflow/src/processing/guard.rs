use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{DocflowError, Result};

/// Supervises one extraction call with a deadline.
///
/// On expiry the operation's future is dropped and its token cancelled, so
/// blocking work that polls the token winds down on its own.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = CancellationToken::new();
        // Cancels on every exit path, including when this future is dropped.
        let _guard = token.clone().drop_guard();

        match tokio::time::timeout(self.deadline, op(token.clone())).await {
            Ok(result) => result,
            Err(_) => {
                token.cancel();
                tracing::debug!(deadline = ?self.deadline, "Extraction deadline expired");
                Err(DocflowError::Timeout(self.deadline))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_fast_operation_passes_through() {
        let guard = TimeoutGuard::new(Duration::from_secs(5));
        let value = guard.run(|_| async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let guard = TimeoutGuard::new(Duration::from_secs(5));
        let err = guard
            .run(|_| async { Err::<(), _>(DocflowError::Parse("bad".to_string())) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_hanging_operation_times_out_and_is_cancelled() {
        let guard = TimeoutGuard::new(Duration::from_millis(50));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let err = guard
            .run(|token| async move {
                let _ = tx.send(token);
                std::future::pending::<Result<()>>().await
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DocflowError::Timeout(d) if d == Duration::from_millis(50)));
        let token = rx.await.unwrap();
        assert!(token.is_cancelled());
    }
}
