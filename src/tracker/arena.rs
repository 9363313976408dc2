//! Ownership of in-flight job tasks
//!
//! Every running job task holds a [`TaskSlot`] from the arena. A job id can
//! hold at most one slot at a time, so a job is never advanced by two timers.
//! Dropping the slot (normal exit, error or panic) releases the id. Slot
//! tokens are children of one arena-wide token, and once that is cancelled
//! the arena refuses new slots.

use crate::types::JobId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct ArenaInner {
    tasks: Mutex<HashMap<JobId, CancellationToken>>,
    idle: Notify,
    root: CancellationToken,
}

/// Map of active job ids to the cancellation tokens of their tasks
#[derive(Clone, Default)]
pub(crate) struct TaskArena {
    inner: Arc<ArenaInner>,
}

impl TaskArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, CancellationToken>> {
        // A panic while holding the lock can't leave the map half-updated
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the slot for `id`
    ///
    /// `None` if a task already owns it or the arena has been closed by
    /// [`cancel_all`](Self::cancel_all).
    pub(crate) fn register(&self, id: JobId) -> Option<TaskSlot> {
        let mut tasks = self.lock();
        if self.inner.root.is_cancelled() || tasks.contains_key(&id) {
            return None;
        }
        let token = self.inner.root.child_token();
        tasks.insert(id, token.clone());
        Some(TaskSlot {
            id,
            token,
            arena: self.clone(),
        })
    }

    /// Whether a task currently owns `id`
    pub(crate) fn contains(&self, id: JobId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of running job tasks
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether [`cancel_all`](Self::cancel_all) has closed the arena
    pub(crate) fn is_closed(&self) -> bool {
        self.inner.root.is_cancelled()
    }

    /// Signal every running task to stop and close the arena to new slots,
    /// returning how many tasks were signalled
    pub(crate) fn cancel_all(&self) -> usize {
        let tasks = self.lock();
        for id in tasks.keys() {
            tracing::debug!(job_id = id.0, "Signaling job task to stop");
        }
        self.inner.root.cancel();
        tasks.len()
    }

    /// Wait until no task is running
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.len() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release(&self, id: JobId) {
        let now_empty = {
            let mut tasks = self.lock();
            tasks.remove(&id);
            tasks.is_empty()
        };
        if now_empty {
            self.inner.idle.notify_waiters();
        }
    }
}

/// A claimed arena slot; releases the job id when dropped
pub(crate) struct TaskSlot {
    id: JobId,
    token: CancellationToken,
    arena: TaskArena,
}

impl TaskSlot {
    /// Token cancelled when the tracker shuts down
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.arena.release(self.id);
    }
}
