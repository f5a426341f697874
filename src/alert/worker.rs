use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::alert::AlertMessage;
use crate::speech::SpeechBackend;

/// Decoupled speech worker.
///
/// The capture loop publishes alerts here instead of speaking them; a
/// dedicated thread performs the blocking synthesis/playback, so a slow
/// announcement never stalls frame capture. The queue holds at most one
/// pending alert and newer alerts replace an unconsumed older one: stale
/// messages are worthless and must not pile up behind slow audio.
pub struct AlertWorker {
    tx: Option<Sender<AlertMessage>>,
    drain: Receiver<AlertMessage>,
    handle: Option<JoinHandle<u64>>,
    dropped: u64,
}

impl AlertWorker {
    /// Spawn the worker thread around a speech backend.
    pub fn spawn(mut backend: Box<dyn SpeechBackend>) -> Result<Self> {
        let (tx, rx) = bounded::<AlertMessage>(1);
        let worker_rx = rx.clone();
        let handle = thread::Builder::new()
            .name("alert-worker".to_string())
            .spawn(move || {
                let mut spoken = 0u64;
                while let Ok(message) = worker_rx.recv() {
                    log::debug!("speaking alert: {}", message.text);
                    match backend.speak(&message.text) {
                        Ok(()) => spoken += 1,
                        Err(err) => log::warn!("voice alert dropped: {}", err),
                    }
                }
                spoken
            })
            .context("failed to spawn alert worker thread")?;

        Ok(Self {
            tx: Some(tx),
            drain: rx,
            handle: Some(handle),
            dropped: 0,
        })
    }

    /// Publish an alert, replacing any unconsumed one.
    pub fn publish(&mut self, message: AlertMessage) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                // Discard the stale alert and keep the newest.
                if self.drain.try_recv().is_ok() {
                    self.dropped += 1;
                }
                if let Err(err) = tx.try_send(message) {
                    log::debug!("alert slot contended, message dropped: {}", err);
                    self.dropped += 1;
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("alert worker is gone; message dropped");
                self.dropped += 1;
            }
        }
    }

    /// Alerts replaced or discarded before they could be spoken.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Stop the worker: close the queue, let it drain, and join.
    ///
    /// Returns the number of alerts actually spoken. A worker panic is
    /// logged, never swallowed silently.
    pub fn shutdown(mut self) -> u64 {
        self.tx.take();
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(spoken) => spoken,
                Err(_) => {
                    log::error!("alert worker panicked during shutdown");
                    0
                }
            },
            None => 0,
        }
    }
}

impl Drop for AlertWorker {
    fn drop(&mut self) {
        // Explicit shutdown is preferred; this just stops the thread if the
        // worker is dropped without one.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("alert worker panicked");
            }
        }
    }
}
