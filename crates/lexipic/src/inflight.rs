use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

use crate::cancel::{CancelHandle, CancelToken, cancel_pair};

/// At most one running translate pass per session.
///
/// Starting a pass cancels whatever that session was still running.
#[derive(Clone, Default)]
pub struct InFlight {
    passes: Arc<DashMap<String, Pass>>,
    next_id: Arc<AtomicU64>,
}

struct Pass {
    id: u64,
    handle: CancelHandle,
}

/// Registration of one pass; deregisters on drop unless already superseded.
pub struct PassGuard {
    passes: Arc<DashMap<String, Pass>>,
    session: String,
    id: u64,
    token: CancelToken,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, session: &str) -> PassGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (handle, token) = cancel_pair();
        if let Some(previous) = self.passes.insert(session.to_string(), Pass { id, handle }) {
            previous.handle.cancel();
            debug!("pass {} for session {session} superseded by {id}", previous.id);
        }
        PassGuard {
            passes: Arc::clone(&self.passes),
            session: session.to_string(),
            id,
            token,
        }
    }

    /// Cancel the running pass of `session`. Returns whether one was running.
    pub fn cancel(&self, session: &str) -> bool {
        match self.passes.remove(session) {
            Some((_, pass)) => {
                pass.handle.cancel();
                debug!("pass {} for session {session} cancelled", pass.id);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl PassGuard {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.passes
            .remove_if(&self.session, |_, pass| pass.id == self.id);
    }
}
