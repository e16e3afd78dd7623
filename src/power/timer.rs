use std::{
    io,
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Callback invoked once when a debounce timer expires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// A cancellable, single-shot delayed callback.
///
/// A timer holds at most one armed callback. Starting it again replaces the
/// previous arming. Cancelling is always safe: after expiry, or repeatedly,
/// it does nothing.
///
/// Cancellation only guarantees that a callback which has not yet been
/// dispatched will never run. A callback racing with `cancel` may still run,
/// so owners must be able to recognise a stale firing.
pub trait DebounceTimer: Send {
    /// Arm the timer to run `callback` once after `delay`
    ///
    /// # Errors
    /// Returns error if the backend cannot schedule the callback. Nothing is
    /// armed in that case and the callback is dropped without running.
    fn start(&mut self, delay: Duration, callback: TimerCallback) -> io::Result<()>;

    /// Discard the armed callback, if it has not fired yet
    fn cancel(&mut self);
}

/// Which implementation backs the controller's debounce timer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerBackend {
    /// A task on the tokio runtime.
    #[default]
    Task,

    /// A dedicated OS thread per arming.
    Thread,
}

impl TimerBackend {
    /// Construct a timer for this backend
    pub fn build(self) -> Box<dyn DebounceTimer> {
        match self {
            TimerBackend::Task => Box::new(TokioTimer::default()),
            TimerBackend::Thread => Box::new(ThreadTimer::default()),
        }
    }
}

/// Debounce timer running as a tokio task.
///
/// Must be started from within a tokio runtime.
#[derive(Default)]
pub struct TokioTimer {
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer for TokioTimer {
    fn start(&mut self, delay: Duration, callback: TimerCallback) -> io::Result<()> {
        self.cancel();

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Debounce timer backed by a sleeping OS thread.
///
/// Cancelling drops the channel the thread waits on, which wakes it without
/// running the callback.
#[derive(Default)]
pub struct ThreadTimer {
    cancel_tx: Option<mpsc::Sender<()>>,
}

impl DebounceTimer for ThreadTimer {
    fn start(&mut self, delay: Duration, callback: TimerCallback) -> io::Result<()> {
        self.cancel();

        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("debounce-timer".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(delay) {
                    callback();
                }
            })?;

        self.cancel_tx = Some(cancel_tx);
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancel_tx = None;
    }
}
