//! Resettable quiet-period timer.
//!
//! Every pushed value replaces the pending one and restarts the deadline.
//! When the deadline passes with no further input the action runs once with
//! the last value. Cancelling (or dropping) the debouncer discards a pending
//! value without running it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the timer task. Must be called within a Tokio runtime.
    ///
    /// Each fired action is spawned as its own task, so a slow action never
    /// delays the handling of later input.
    pub fn spawn<F, Fut>(delay: Duration, mut action: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let timer = tokio::time::sleep(delay);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    input = rx.recv() => match input {
                        Some(value) => {
                            pending = Some(value);
                            timer.as_mut().reset(Instant::now() + delay);
                        }
                        None => break,
                    },
                    _ = &mut timer, if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            tokio::spawn(action(value));
                        }
                    }
                }
            }

            if pending.is_some() {
                tracing::debug!("Debouncer stopped with pending input discarded");
            }
        });

        Self { tx, cancel, handle }
    }

    /// Record an input event. Returns `false` once the debouncer has stopped.
    pub fn push(&self, value: T) -> bool {
        !self.cancel.is_cancelled() && self.tx.send(value).is_ok()
    }

    /// Stop the timer; a pending value never fires.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
