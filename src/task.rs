//! Cancellable units of work.
//!
//! Each coordinator holds one [`TaskSlot`]. Starting new work through the
//! slot cancels whatever the slot held before, so at most one unit is ever
//! "the active one". Cancellation is cooperative: a unit races its awaits
//! against its token and checks the token again before committing state.

use crate::client::ApiError;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub(crate) struct TaskSlot {
    current: Mutex<Option<Active>>,
}

#[derive(Debug)]
struct Active {
    token: CancellationToken,
    // Kept so the task is owned by the slot; never joined
    _handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    /// Cancels the previous unit and returns a fresh token for inline work.
    pub(crate) fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        self.install(token.clone(), None);
        token
    }

    /// Cancels the previous unit and spawns `work` as the new active one.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<F, Fut>(&self, work: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        // Cancel first so the old unit can't commit after the new one starts
        self.cancel();
        let handle = tokio::spawn(work(token.clone()));
        self.install(token, Some(handle));
    }

    /// Cancels the active unit, if any.
    pub(crate) fn cancel(&self) {
        if let Some(active) = self.lock().take() {
            active.token.cancel();
        }
    }

    fn install(&self, token: CancellationToken, handle: Option<JoinHandle<()>>) {
        let previous = self.lock().replace(Active {
            token,
            _handle: handle,
        });
        if let Some(previous) = previous {
            previous.token.cancel();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Active>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Awaits `work` unless `token` fires first, in which case the result is a
/// cancellation error.
pub(crate) async fn until_cancelled<T, Fut>(
    token: &CancellationToken,
    work: Fut,
) -> Result<T, ApiError>
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::cancelled()),
        result = work => result,
    }
}

/// Applies `update` to the published state unless `token` has been
/// cancelled. The check runs under the channel lock, so a superseded unit
/// can never commit after its successor has published.
///
/// Returns whether the update was applied.
pub(crate) fn commit<S>(
    state: &watch::Sender<S>,
    token: &CancellationToken,
    update: impl FnOnce(&mut S),
) -> bool {
    let mut applied = false;
    state.send_if_modified(|current| {
        if token.is_cancelled() {
            return false;
        }
        update(current);
        applied = true;
        true
    });
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_spawn_cancels_previous_unit() {
        let slot = TaskSlot::default();
        let (first_tx, mut first_rx) = tokio::sync::oneshot::channel();

        slot.spawn(|token| async move {
            token.cancelled().await;
            let _ = first_tx.send(());
        });
        slot.spawn(|_| async {});

        tokio::time::timeout(Duration::from_secs(1), &mut first_rx)
            .await
            .expect("first unit should observe cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn test_begin_cancels_previous_token() {
        let slot = TaskSlot::default();
        let first = slot.begin();
        let second = slot.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        slot.cancel();
        assert!(second.is_cancelled());
    }

    #[tokio::test]
    async fn test_until_cancelled() {
        let token = CancellationToken::new();
        let ok: Result<u8, ApiError> = until_cancelled(&token, async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        token.cancel();
        let cancelled: Result<u8, ApiError> =
            until_cancelled(&token, std::future::pending()).await;
        assert!(cancelled.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_commit_skips_cancelled_token() {
        let (state, _rx) = watch::channel(0u32);
        let token = CancellationToken::new();

        assert!(commit(&state, &token, |s| *s = 1));
        token.cancel();
        assert!(!commit(&state, &token, |s| *s = 2));
        assert_eq!(*state.borrow(), 1);
    }
}
