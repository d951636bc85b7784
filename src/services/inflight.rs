// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-key in-flight operation guard.
//!
//! Each key is either idle or has exactly one pending operation. A caller
//! that arrives while an operation is pending does not start its own; it
//! awaits the pending one and receives the same outcome, flagged `joined`.
//! The operation runs on its own task, so it completes (and the key returns
//! to idle) even if every caller stops waiting.

use crate::error::AppError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::Arc;

type Pending<T> = Shared<BoxFuture<'static, Result<T, Arc<AppError>>>>;

/// Result of a guarded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T> {
    pub value: T,
    /// True when this caller awaited an operation started by someone else.
    pub joined: bool,
}

/// Map from key to the single pending operation for that key.
pub struct InFlight<T> {
    pending: Arc<DashMap<String, Pending<T>>>,
}

impl<T> Default for InFlight<T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
        }
    }
}

/// Returns the key to idle when the operation finishes, even on panic.
struct ClearOnDrop<T> {
    pending: Arc<DashMap<String, Pending<T>>>,
    key: String,
}

impl<T> Drop for ClearOnDrop<T> {
    fn drop(&mut self) {
        self.pending.remove(&self.key);
    }
}

impl<T> InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an operation for `key` is pending.
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Run `op` for `key`, or join the operation already pending for it.
    pub async fn run<F>(&self, key: &str, op: F) -> Result<Settled<T>, AppError>
    where
        F: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let (pending, joined) = match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), true),
            Entry::Vacant(entry) => {
                let pending = self.start(key.to_string(), op);
                entry.insert(pending.clone());
                (pending, false)
            }
        };

        if joined {
            tracing::debug!(key, "Joining in-flight operation");
        }

        pending
            .await
            .map(|value| Settled { value, joined })
            .map_err(AppError::from_shared)
    }

    fn start<F>(&self, key: String, op: F) -> Pending<T>
    where
        F: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let clear = ClearOnDrop {
            pending: Arc::clone(&self.pending),
            key,
        };
        let handle = tokio::spawn(async move {
            let _clear = clear;
            op.await
        });

        async move {
            match handle.await {
                Ok(result) => result.map_err(Arc::new),
                Err(e) => Err(Arc::new(AppError::Internal(anyhow::anyhow!(
                    "In-flight operation aborted: {}",
                    e
                )))),
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_second_caller_joins_pending_operation() {
        let guard: InFlight<u32> = InFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let op = |value: u32| {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(value)
            }
        };

        let (first, second) = tokio::join!(guard.run("q1", op(1)), guard.run("q1", op(2)));

        assert_eq!(first.unwrap(), Settled { value: 1, joined: false });
        assert_eq!(second.unwrap(), Settled { value: 1, joined: true });
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!guard.is_pending("q1"));
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let guard: InFlight<&'static str> = InFlight::new();

        let (a, b) = tokio::join!(
            guard.run("q1", async { Ok("a") }),
            guard.run("q2", async { Ok("b") })
        );

        assert!(!a.unwrap().joined);
        assert!(!b.unwrap().joined);
    }

    #[tokio::test]
    async fn test_failure_clears_key_for_retry() {
        let guard: InFlight<u32> = InFlight::new();

        let err = guard
            .run("q1", async { Err(AppError::Database("boom".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(!guard.is_pending("q1"));

        let retry = guard.run("q1", async { Ok(7) }).await.unwrap();
        assert_eq!(retry.value, 7);
    }

    #[tokio::test]
    async fn test_joined_failure_is_shared() {
        let guard: InFlight<u32> = InFlight::new();
        let failing = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(AppError::Database("down".to_string()))
        };

        let (first, second) = tokio::join!(guard.run("q1", failing), guard.run("q1", async { Ok(1) }));

        assert!(matches!(first.unwrap_err().root(), AppError::Database(_)));
        assert!(matches!(second.unwrap_err().root(), AppError::Database(_)));
    }
}
