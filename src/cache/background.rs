use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Supervisor for fire-and-forget cache writes
///
/// Writes are spawned onto the runtime and the caller returns immediately.
/// [`BackgroundWrites::drain`] waits for whatever is still pending; the server
/// calls it after graceful shutdown so no write is lost on teardown.
#[derive(Debug, Default)]
pub struct BackgroundWrites {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `write` without waiting for it. Must be called inside a tokio runtime.
    pub fn spawn<F>(&self, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.lock();
        // Reap finished writes so the set does not grow unbounded
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                warn!(error = %e, "Background cache write failed");
            }
        }
        tasks.spawn(write);
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Wait for every write spawned so far
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(&mut *self.lock());
        if tasks.is_empty() {
            return;
        }

        debug!(pending = tasks.len(), "Draining background cache writes");
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                warn!(error = %e, "Background cache write failed");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
