use arc_swap::ArcSwap;
use fieldx::fxstruct;
use std::sync::Arc;
use tracing::debug;

use crate::types::Slot;
use crate::types::Snapshot;
use crate::types::SnapshotBuilder;

/// Holds the precomputed sample slots served to readers.
///
/// The current [`Snapshot`] lives behind a single atomically swappable reference. Readers only ever dereference
/// whatever snapshot is current at the moment of the call, so a slot is either observed as a whole or not at all, no
/// matter what the refresher is doing in the meantime. There is no locking on the read path.
///
/// ```ignore
/// let cache = SampleCache::builder().slot_count(30).slot_size(20).build()?;
///
/// let mut builder = cache.snapshot_builder();
/// builder.fill(0, stars);
/// cache.publish(builder);
///
/// let slot = cache.get(0);
/// ```
#[fxstruct(sync, no_new, builder(post_build), get(copy))]
pub struct SampleCache {
    /// Number of slots in every snapshot.
    #[fieldx(default(30))]
    slot_count: usize,

    /// Number of stars requested from the storage for each slot.
    #[fieldx(default(20))]
    slot_size: usize,

    #[fieldx(get(off), builder(off))]
    current: ArcSwap<Snapshot>,
}

impl SampleCache {
    fn post_build(self) -> Self {
        self.current.store(Arc::new(Snapshot::empty(self.slot_count)));
        self
    }

    /// Return the slot at `index` of the current snapshot. The cache does no randomization of its own.
    #[inline]
    pub fn get(&self, index: usize) -> Slot {
        self.current.load().slot(index)
    }

    /// The whole current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// A builder sized for this cache.
    pub fn snapshot_builder(&self) -> SnapshotBuilder {
        SnapshotBuilder::new(self.slot_count)
    }

    /// Replace the current snapshot in a single step. Returns the generation of the published snapshot.
    ///
    /// There is only one refresher per cache, so the read-increment-store of the generation does not race.
    pub fn publish(&self, builder: SnapshotBuilder) -> u64 {
        let generation = self.generation() + 1;
        let snapshot = builder.build(generation);
        debug!(
            generation,
            ready = snapshot.ready_count(),
            total = snapshot.len(),
            "publishing cache snapshot"
        );
        self.current.store(Arc::new(snapshot));
        generation
    }

    /// True once at least one snapshot has been published.
    pub fn is_warm(&self) -> bool {
        self.generation() > 0
    }
}
