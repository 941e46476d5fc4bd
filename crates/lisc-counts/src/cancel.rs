//! Cooperative cancellation for long-running sweeps.
//!
//! The sweep checks its [`CancelToken`] between lookups, never during one.
//! A cancelled sweep still returns the partially filled matrix.

use std::sync::Arc;
use tokio::sync::watch;

/// Raises the cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Observes the cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Creates a connected handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
}

impl CancelHandle {
    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Another token observing this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested.
    ///
    /// Never resolves if every handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_uncancelled() {
        let (_handle, token) = cancel_pair();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_seen_by_all_tokens() {
        let (handle, token) = cancel_pair();
        let second = handle.token();
        let cloned = token.clone();

        handle.cancel();
        handle.cancel();

        assert!(token.is_cancelled());
        assert!(second.is_cancelled());
        assert!(cloned.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves() {
        let (handle, mut token) = cancel_pair();

        let waiter = tokio::spawn(async move {
            token.cancelled().await;
        });
        handle.cancel();

        tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
