use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;

use crate::queue::PendingStars;
use crate::traits::StorageGateway;
use crate::types::Star;

/// Counters reported by a worker when it stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub stored:  usize,
    pub dropped: usize,
}

/// The single consumer of the write queue.
///
/// Stars are persisted one at a time, in the order they were accepted. Delivery is best-effort and at-most-once: a
/// star the storage refuses is logged and dropped, and the worker proceeds with the next one.
pub struct WriteWorker<G>
where
    G: StorageGateway,
{
    pending: PendingStars,
    gateway: Arc<G>,
    report:  WorkerReport,
}

impl<G> WriteWorker<G>
where
    G: StorageGateway,
{
    pub fn new(pending: PendingStars, gateway: Arc<G>) -> Self {
        Self {
            pending,
            gateway,
            report: WorkerReport::default(),
        }
    }

    async fn store(&mut self, star: Star) {
        match self.gateway.insert(&star).await {
            Ok(()) => {
                self.report.stored += 1;
            }
            Err(err) => {
                error!(star = %star, error = %err, "failed to store star, dropping it");
                self.report.dropped += 1;
            }
        }
    }

    /// Drain the queue until cancelled or until every producer is gone.
    ///
    /// On cancellation the queue is closed to new stars and whatever was already accepted is still handed to the
    /// storage before the worker returns.
    #[instrument(level = "debug", skip(self, cancel))]
    pub async fn run(mut self, cancel: CancellationToken) -> WorkerReport {
        debug!("Write worker started.");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = self.pending.next() => match next {
                    Some(star) => self.store(star).await,
                    None => {
                        info!(stored = self.report.stored, dropped = self.report.dropped, "Write queue closed.");
                        return self.report;
                    }
                },
            }
        }

        self.pending.close();
        let backlog = self.pending.len();
        if backlog > 0 {
            info!(backlog, "Draining write queue before shutdown.");
        }
        while let Some(star) = self.pending.next().await {
            self.store(star).await;
        }

        info!(stored = self.report.stored, dropped = self.report.dropped, "Write worker stopped.");
        self.report
    }
}
