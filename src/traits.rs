use async_trait::async_trait;
use std::fmt::Debug;
use std::fmt::Display;

use crate::types::Donation;
use crate::types::Star;

/// The persistent store behind the cache and the write queue.
///
/// The core only ever needs two primitives from it: random sampling for the refresher and single-record insertion for
/// the write worker. Errors are never propagated to request handlers; the background tasks log them and move on, hence
/// the loose bounds on the associated error type.
#[async_trait]
pub trait StorageGateway: Send + Sync + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// Return up to `n` randomly chosen stars. No ordering semantics beyond "random"; repeats across calls are fine.
    async fn sample_random(&self, n: usize) -> Result<Vec<Star>, Self::Error>;

    /// Persist a single star. Any identity assignment is the storage's business.
    async fn insert(&self, star: &Star) -> Result<(), Self::Error>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Storage able to record donations as well. Donations share the gateway's error type.
#[async_trait]
pub trait DonationLedger: StorageGateway {
    /// Persist a single donation. Called on the request path, not from a background task.
    async fn record_donation(&self, donation: &Donation) -> Result<(), Self::Error>;
}
