use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use star_cache::prelude::*;
use star_cache::test::MemoryGateway;
use tokio::sync::Semaphore;

fn settings(slot_count: usize, slot_size: usize) -> star_cache::config::ServiceSettingsBuilder {
    ServiceSettings::builder()
        .slot_count(slot_count)
        .slot_size(slot_size)
        .refresh_interval(Duration::from_secs(3600))
}

/// Tags every sampled star with the refresh generation that requested it. Refreshes sample slots sequentially, so
/// calls `(g - 1) * slot_count .. g * slot_count` belong to generation `g`.
struct GenerationGateway {
    slot_count: usize,
    calls:      AtomicUsize,
}

#[async_trait]
impl StorageGateway for GenerationGateway {
    type Error = String;

    async fn sample_random(&self, n: usize) -> Result<Vec<Star>, Self::Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let generation = call / self.slot_count + 1;
        tokio::task::yield_now().await;
        Ok((0..n)
            .map(|i| Star::new(format!("gen-{generation}"), format!("#{i}")))
            .collect())
    }

    async fn insert(&self, _star: &Star) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Inserts block until a permit is released, letting a test decide when the worker makes progress.
struct GatedGateway {
    gate:     Semaphore,
    started:  AtomicUsize,
    inserted: Mutex<Vec<Star>>,
}

impl GatedGateway {
    fn new() -> Self {
        Self {
            gate:     Semaphore::new(0),
            started:  AtomicUsize::new(0),
            inserted: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl StorageGateway for GatedGateway {
    type Error = String;

    async fn sample_random(&self, _n: usize) -> Result<Vec<Star>, Self::Error> {
        Ok(vec![])
    }

    async fn insert(&self, star: &Star) -> Result<(), Self::Error> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.gate
            .acquire()
            .await
            .map_err(|err| err.to_string())?
            .forget();
        self.inserted.lock().push(star.clone());
        Ok(())
    }
}

async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_mixed_generations() {
    let slot_count = 8;
    let gateway = Arc::new(GenerationGateway {
        slot_count,
        calls: AtomicUsize::new(0),
    });
    let service = Arc::new(
        StarService::start(
            settings(slot_count, 5)
                .refresh_interval(Duration::from_millis(3))
                .build()
                .unwrap(),
            gateway,
        )
        .await
        .unwrap(),
    );

    let mut readers = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let service = service.clone();
        readers.spawn(async move {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(300);
            let mut checked = 0usize;
            while tokio::time::Instant::now() < deadline {
                let stars = service.handle_read().into_stars().expect("warm cache");
                assert_eq!(stars.len(), 5);
                assert!(stars.iter().all(|s| s.name == stars[0].name), "torn slot: {stars:?}");

                let snapshot = service.cache().snapshot();
                let expected = format!("gen-{}", snapshot.generation());
                for slot in snapshot.slots() {
                    let stars = slot.stars().expect("no failures scripted");
                    assert!(stars.iter().all(|s| s.name == expected), "slot from another generation");
                }

                checked += 1;
                tokio::task::yield_now().await;
            }
            checked
        });
    }

    while let Some(checked) = readers.join_next().await {
        assert!(checked.unwrap() > 0);
    }

    assert!(service.cache().generation() > 1, "refresher never ran");
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn warm_cache_before_first_read() {
    let gateway = Arc::new(MemoryGateway::seeded(50));
    let service = StarService::start(settings(30, 20).build().unwrap(), gateway.clone())
        .await
        .unwrap();

    assert_eq!(gateway.sample_calls(), 30);
    assert_eq!(service.cache().snapshot().ready_count(), 30);
    assert_eq!(service.handle_read().stars().map(|s| s.len()), Some(20));

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn one_failed_slot_out_of_thirty() {
    let gateway = Arc::new(MemoryGateway::seeded(50));
    gateway.fail_sample_calls([7]);
    let service = StarService::start(settings(30, 20).build().unwrap(), gateway)
        .await
        .unwrap();

    let cache = service.cache();
    assert!(cache.get(7).is_empty());
    for i in (0..30).filter(|i| *i != 7) {
        assert_eq!(cache.get(i).stars().map(|s| s.len()), Some(20));
    }

    service.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn backpressure_and_fifo_persistence() {
    let gateway = Arc::new(GatedGateway::new());
    let service = StarService::start(
        settings(1, 1)
            .queue_capacity(2)
            .enqueue_timeout(Duration::from_secs(1))
            .build()
            .unwrap(),
        gateway.clone(),
    )
    .await
    .unwrap();

    let star = |n: usize| Star::new(format!("R{n}"), "m");

    // The worker takes R1 off the queue and gets stuck inserting it.
    assert_eq!(service.handle_create(star(1)).await, CreateOutcome::Accepted);
    wait_for("worker to pick R1", || gateway.started.load(Ordering::SeqCst) == 1).await;

    assert_eq!(service.handle_create(star(2)).await, CreateOutcome::Accepted);
    assert_eq!(service.handle_create(star(3)).await, CreateOutcome::Accepted);
    assert_eq!(service.queue().len(), 2);

    let started = tokio::time::Instant::now();
    assert_eq!(service.handle_create(star(4)).await, CreateOutcome::Rejected);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(service.queue().len(), 2);

    // Let one insert through; the worker then takes R2 and frees a place.
    gateway.gate.add_permits(1);
    wait_for("a free place in the queue", || service.queue().len() < 2).await;
    assert_eq!(service.handle_create(star(4)).await, CreateOutcome::Accepted);

    gateway.gate.add_permits(10);
    let report = service.shutdown().await.unwrap().unwrap();
    assert_eq!(report.stored, 4);

    let names: Vec<_> = gateway.inserted.lock().iter().map(|s| s.name.clone()).collect();
    assert_eq!(names, ["R1", "R2", "R3", "R4"]);
}

#[tokio::test]
async fn failed_write_does_not_stop_the_worker() {
    let gateway = Arc::new(MemoryGateway::default());
    gateway.fail_inserts_when(|star| star.name == "doomed");
    let service = StarService::start(settings(1, 1).build().unwrap(), gateway.clone())
        .await
        .unwrap();

    for name in ["first", "doomed", "last"] {
        assert_eq!(
            service.handle_create(Star::new(name, "m")).await,
            CreateOutcome::Accepted
        );
    }

    let report = service.shutdown().await.unwrap().unwrap();
    assert_eq!(report.stored, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(gateway.inserted(), vec![Star::new("first", "m"), Star::new("last", "m")]);
}

#[tokio::test]
async fn accepted_writes_show_up_after_refresh() {
    let gateway = Arc::new(MemoryGateway::default());
    let service = StarService::start(
        settings(2, 1)
            .refresh_interval(Duration::from_millis(10))
            .build()
            .unwrap(),
        gateway.clone(),
    )
    .await
    .unwrap();

    // Nothing stored yet: slots are populated, just with nothing in them.
    assert_eq!(service.handle_read().stars().map(|s| s.len()), Some(0));

    service.handle_create(Star::new("late", "arrival")).await;
    wait_for("the star to be sampled", || {
        service
            .cache()
            .get(0)
            .stars()
            .is_some_and(|stars| stars.first().is_some_and(|s| s.name == "late"))
    })
    .await;

    service.shutdown().await.unwrap();
}
