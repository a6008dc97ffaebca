//! A rule engine shared between threads.
//!
//! All mutation goes through one mutex, so messages, forced facts and
//! timing sweeps from different threads are serialized.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use alarmist_foundation::{Message, Result};
use parking_lot::{Mutex, MutexGuard};

use crate::engine::{Alarm, ExecuteReport, FeedReport, RuleEngine};

/// A cloneable handle to a [`RuleEngine`] behind a mutex.
#[derive(Clone, Debug)]
pub struct SharedEngine {
    inner: Arc<Mutex<RuleEngine>>,
}

impl SharedEngine {
    /// Wraps an engine.
    #[must_use]
    pub fn new(engine: RuleEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Runs one message through the engine.
    pub fn feed(&self, message: &Message) -> FeedReport {
        self.inner.lock().feed(message)
    }

    /// Forces facts and chains the results.
    ///
    /// # Errors
    ///
    /// See [`RuleEngine::force`].
    pub fn force(&self, facts: &[(&str, bool)]) -> Result<ExecuteReport> {
        self.inner.lock().force(facts)
    }

    /// Delivers due timing events.
    pub fn sweep(&self) -> Vec<Alarm> {
        self.inner.lock().sweep()
    }

    /// Locks the engine for direct access.
    pub fn lock(&self) -> MutexGuard<'_, RuleEngine> {
        self.inner.lock()
    }

    /// Starts a thread that sweeps every `sweep_interval` until `stop` is
    /// set. Alarms reach the engine's alarm callback.
    #[must_use]
    pub fn spawn_sweeper(&self, stop: Arc<AtomicBool>) -> JoinHandle<()> {
        let engine = self.clone();
        let interval = self.inner.lock().config().sweep_interval;
        thread::spawn(move || {
            tracing::debug!(?interval, "sweeper started");
            while !stop.load(Ordering::SeqCst) {
                let alarms = engine.sweep();
                if !alarms.is_empty() {
                    tracing::debug!(count = alarms.len(), "sweep raised alarms");
                }
                thread::sleep(interval);
            }
            tracing::debug!("sweeper stopped");
        })
    }
}

impl From<RuleEngine> for SharedEngine {
    fn from(engine: RuleEngine) -> Self {
        Self::new(engine)
    }
}
