use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::types::EnqueueOutcome;
use crate::types::Star;

/// Producer side of the bounded write queue.
///
/// Any number of request handlers may hold a clone and enqueue concurrently. The queue never holds more than its
/// capacity; a producer finding it full waits up to the given timeout for a free place and is rejected otherwise.
#[derive(Clone, Debug)]
pub struct WriteQueue {
    tx: mpsc::Sender<Star>,
}

/// Consumer side of the write queue. There is exactly one and it belongs to the
/// [`WriteWorker`](crate::worker::WriteWorker).
#[derive(Debug)]
pub struct PendingStars {
    rx: mpsc::Receiver<Star>,
}

impl WriteQueue {
    /// Create a queue with room for `capacity` stars.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn bounded(capacity: usize) -> (Self, PendingStars) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, PendingStars { rx })
    }

    pub async fn enqueue(&self, star: Star, timeout: Duration) -> EnqueueOutcome {
        if timeout.is_zero() {
            return match self.tx.try_send(star) {
                Ok(()) => EnqueueOutcome::Accepted,
                Err(TrySendError::Full(star)) => self.rejected(star),
                Err(TrySendError::Closed(star)) => EnqueueOutcome::Closed(star),
            };
        }

        match self.tx.send_timeout(star, timeout).await {
            Ok(()) => EnqueueOutcome::Accepted,
            Err(SendTimeoutError::Timeout(star)) => self.rejected(star),
            Err(SendTimeoutError::Closed(star)) => EnqueueOutcome::Closed(star),
        }
    }

    fn rejected(&self, star: Star) -> EnqueueOutcome {
        debug!(capacity = self.capacity(), "write queue is full, rejecting star from '{}'", star.name);
        EnqueueOutcome::Rejected(star)
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of stars waiting for the worker. Producers blocked on a full queue are not counted.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl PendingStars {
    /// Wait for the oldest queued star. `None` once the queue is closed and drained, or all producers are gone.
    pub async fn next(&mut self) -> Option<Star> {
        self.rx.recv().await
    }

    /// Stop accepting new stars. Stars already queued can still be taken with [`next`](Self::next).
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
