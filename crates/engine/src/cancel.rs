// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External cancellation of a running flow

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Default)]
struct CancelState {
    reason: Mutex<Option<String>>,
    notify: Notify,
}

/// Shared handle used to cancel a flow from outside its task.
///
/// The flow checks the token at every poll-cycle boundary and wakes from its
/// sleep as soon as the token is cancelled.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with `reason`, usually a signal name. Only the first reason sticks.
    pub fn cancel(&self, reason: impl Into<String>) {
        {
            let mut current = self.inner.reason.lock();
            if current.is_some() {
                return;
            }
            *current = Some(reason.into());
        }
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.lock().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.inner.reason.lock().clone()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Cancel this token on SIGTERM or SIGINT.
    #[cfg(unix)]
    pub fn on_signals(&self) -> std::io::Result<tokio::task::JoinHandle<()>> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let token = self.clone();
        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => token.cancel("SIGTERM"),
                _ = sigint.recv() => token.cancel("SIGINT"),
            }
        }))
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
