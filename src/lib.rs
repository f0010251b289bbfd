//! # star-cache
//!
//! A read-through sampling cache and a bounded write-behind queue for a message board of "stars": short
//! name + message pairs served to many readers while a steady trickle of writers adds new ones.
//!
//! # The Basics
//!
//! Reads never touch the database. Instead, the cache keeps a fixed number of precomputed *slots*, each a batch of
//! stars sampled at random from the storage. A reader picks a slot at random and gets it in O(1).
//!
//! Writes never wait for the database either. A new star is validated, put on a bounded queue and acknowledged as
//! *pending*. A single background worker drains the queue and inserts the stars one by one, in acceptance order.
//!
//! ```text
//!                 ┌───────────┐  every interval   ┌──────────┐
//!   readers ────► │SampleCache│ ◄──── Refresher ◄─│          │
//!                 └───────────┘                   │ Storage  │
//!                 ┌───────────┐                   │ Gateway  │
//!   writers ────► │WriteQueue │ ────► WriteWorker►│          │
//!                 └───────────┘                   └──────────┘
//! ```
//!
//! # Snapshots
//!
//! The cache content is a [`Snapshot`](types::Snapshot): all slots of one refresh *generation*. The
//! [`Refresher`](refresher::Refresher) builds a new snapshot off to the side and publishes it in a single atomic
//! swap. A reader either sees the old snapshot or the new one, never a mix of both, and a slot already handed out
//! stays intact for as long as the reader holds it.
//!
//! When sampling fails for a slot, the slot is published empty and the failure is logged. Other slots are not
//! affected. Reading an empty slot is a transient condition, and the HTTP layer reports it as a retryable server
//! error.
//!
//! # Backpressure
//!
//! The [`WriteQueue`](queue::WriteQueue) never grows beyond its capacity. When it is full, a producer waits up to the
//! configured timeout for a free place and is then rejected. That rejection is a load-shedding signal, distinct from
//! a validation error, and is reported to HTTP clients as `503`.
//!
//! # Delivery
//!
//! Persistence is best-effort and at-most-once. A star refused by the storage is logged and dropped; the worker
//! carries on with the next one. On shutdown the worker drains what is already queued before it stops.
//!
//! # Donations
//!
//! Donation pledges are plain bookkeeping: validated and written straight through a
//! [`DonationLedger`](traits::DonationLedger), without the cache or the queue.
//!
//! # Storage
//!
//! Anything implementing [`StorageGateway`] can back the service. The crate ships [`DbGateway`](db::DbGateway), built
//! on SeaORM with PostgreSQL (`pg` feature) and SQLite (`sqlite` feature) drivers.

pub mod app;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod queue;
pub mod refresher;
pub mod service;
pub mod traits;
pub mod types;
pub mod worker;

#[doc(inline)]
pub use cache::SampleCache;
#[doc(inline)]
pub use service::StarService;
#[doc(inline)]
pub use traits::StorageGateway;

pub mod prelude {
    pub use crate::cache::SampleCache;
    pub use crate::config::ServiceSettings;
    pub use crate::error::Result;
    pub use crate::error::StarError;
    pub use crate::service::StarService;
    pub use crate::traits::StorageGateway;
    pub use crate::types::*;
}
