//! Loading indicator with an elapsed-seconds ticker
//!
//! [`LoadingIndicator::begin`] starts a one-second tokio ticker and returns a
//! [`LoadingGuard`]. Dropping the guard aborts the ticker and clears the
//! status, so every exit path of a handler leaves the indicator idle.

use crate::conversation::message::MessageKind;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Snapshot of the loading indicator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadingStatus {
    pub active: bool,
    pub kind: Option<MessageKind>,
    pub text: String,
    pub elapsed_seconds: u64,
}

/// Shared loading state
///
/// Cloning yields a handle onto the same state, which is how the terminal
/// front-end watches progress while a handler is awaiting the backend.
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    status: Arc<RwLock<LoadingStatus>>,
    ticking: Arc<AtomicBool>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates the indicator and starts the elapsed-seconds ticker
    ///
    /// Must be called from within a tokio runtime.
    pub fn begin(&self, kind: MessageKind, text: impl Into<String>) -> LoadingGuard {
        if let Ok(mut status) = self.status.write() {
            *status = LoadingStatus {
                active: true,
                kind: Some(kind),
                text: text.into(),
                elapsed_seconds: 0,
            };
        }
        self.ticking.store(true, Ordering::SeqCst);

        let status = Arc::clone(&self.status);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Ok(mut status) = status.write() {
                    // A tick racing the guard's drop must not revive a cleared status
                    if !status.active {
                        break;
                    }
                    status.elapsed_seconds += 1;
                }
            }
        });

        LoadingGuard {
            indicator: self.clone(),
            ticker: Some(ticker),
        }
    }

    /// Switches the subtype and text without restarting the clock
    pub fn set_phase(&self, kind: MessageKind, text: impl Into<String>) {
        if let Ok(mut status) = self.status.write() {
            if status.active {
                status.kind = Some(kind);
                status.text = text.into();
            }
        }
    }

    /// Current status
    pub fn snapshot(&self) -> LoadingStatus {
        self.status
            .read()
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    /// True while a ticker task is running
    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.ticking.store(false, Ordering::SeqCst);
        if let Ok(mut status) = self.status.write() {
            *status = LoadingStatus::default();
        }
    }
}

/// Keeps the indicator active; clears it when dropped
#[derive(Debug)]
pub struct LoadingGuard {
    indicator: LoadingIndicator,
    ticker: Option<JoinHandle<()>>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.indicator.clear();
    }
}
