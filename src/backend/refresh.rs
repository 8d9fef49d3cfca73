//! Single-flight coordination of refresh-token exchanges.
//!
//! A refresh token is single-use on the backend: the first exchange rotates it and
//! every later exchange with the old value fails. When several requests from the same
//! session hit a 401 at once they must share one exchange, and requests that arrive
//! shortly after with the old token must receive the pair that replaced it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::BackendError;
use super::types::TokenPair;

/// How long a rotated pair is handed out to callers still holding the old refresh token.
pub const REFRESH_REUSE_WINDOW: Duration = Duration::from_secs(30);

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenPair, BackendError>>>;

enum Slot {
    InFlight(RefreshFuture),
    Done { pair: TokenPair, at: Instant },
}

/// Serializes refresh exchanges per refresh token.
pub struct RefreshCoordinator {
    slots: Mutex<HashMap<String, Slot>>,
    reuse_window: Duration,
}

impl RefreshCoordinator {
    pub fn new(reuse_window: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            reuse_window,
        }
    }

    /// Exchange `refresh_token`, joining an exchange already running for the same token.
    ///
    /// `start` is only invoked when no exchange is in flight and no recent result exists.
    /// Failures are not remembered, so the next caller starts a fresh exchange.
    pub async fn run<F>(&self, refresh_token: &str, start: F) -> Result<TokenPair, BackendError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<TokenPair, BackendError>>,
    {
        let mut slots = self.slots.lock().await;

        // A finished exchange may not have been recorded by its leader yet
        for slot in slots.values_mut() {
            let finished = match slot {
                Slot::InFlight(pending) => match pending.peek() {
                    Some(Ok(pair)) => Some(pair.clone()),
                    _ => None,
                },
                Slot::Done { .. } => None,
            };
            if let Some(pair) = finished {
                *slot = Slot::Done {
                    pair,
                    at: Instant::now(),
                };
            }
        }

        let window = self.reuse_window;
        slots.retain(|_, slot| match slot {
            Slot::InFlight(pending) => pending.peek().is_none(),
            Slot::Done { at, .. } => at.elapsed() < window,
        });

        let pending = match slots.get(refresh_token) {
            Some(Slot::Done { pair, .. }) => {
                debug!("Reusing recently rotated token pair");
                return Ok(pair.clone());
            }
            Some(Slot::InFlight(pending)) => Some(pending.clone()),
            None => None,
        };

        if let Some(pending) = pending {
            drop(slots);
            debug!("Joining in-flight token refresh");
            return pending.await;
        }

        let pending = start().shared();
        slots.insert(
            refresh_token.to_string(),
            Slot::InFlight(pending.clone()),
        );
        drop(slots);

        let result = pending.await;

        let mut slots = self.slots.lock().await;
        match &result {
            Ok(pair) => {
                slots.insert(
                    refresh_token.to_string(),
                    Slot::Done {
                        pair: pair.clone(),
                        at: Instant::now(),
                    },
                );
            }
            Err(_) => {
                slots.remove(refresh_token);
            }
        }

        result
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new(REFRESH_REUSE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pair(n: usize) -> TokenPair {
        TokenPair {
            access_token: format!("access-{}", n),
            refresh_token: format!("refresh-{}", n),
            expires_at: None,
        }
    }

    fn counting_start(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<TokenPair, BackendError>> {
        let calls = calls.clone();
        move || {
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(delay).await;
                Ok(pair(n))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_exchange() {
        let coordinator = RefreshCoordinator::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let delay = Duration::from_millis(50);

        let (first, second) = tokio::join!(
            coordinator.run("r0", counting_start(&calls, delay)),
            coordinator.run("r0", counting_start(&calls, delay)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.unwrap(), pair(1));
        assert_eq!(second.unwrap(), pair(1));
    }

    #[tokio::test]
    async fn test_late_caller_reuses_rotated_pair() {
        let coordinator = RefreshCoordinator::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = coordinator
            .run("r0", counting_start(&calls, Duration::ZERO))
            .await
            .unwrap();
        let second = coordinator
            .run("r0", counting_start(&calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_distinct_tokens_refresh_independently() {
        let coordinator = RefreshCoordinator::default();
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator
            .run("r0", counting_start(&calls, Duration::ZERO))
            .await
            .unwrap();
        coordinator
            .run("other", counting_start(&calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reuse_window_expires() {
        let coordinator = RefreshCoordinator::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator
            .run("r0", counting_start(&calls, Duration::ZERO))
            .await
            .unwrap();
        let second = coordinator
            .run("r0", counting_start(&calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second, pair(2));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let coordinator = RefreshCoordinator::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = calls.clone();
            move || {
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<TokenPair, _>(BackendError::SessionExpired)
                }
                .boxed()
            }
        };

        let result = coordinator.run("r0", failing).await;
        assert_eq!(result, Err(BackendError::SessionExpired));

        let retry = coordinator
            .run("r0", counting_start(&calls, Duration::ZERO))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(retry.is_ok());
    }
}
