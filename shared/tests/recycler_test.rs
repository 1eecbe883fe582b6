//! 재활용 풀 통합 테스트

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Barrier;
use uranus_shared::recycler::{Package, PackageHeader, Recycler};
use uranus_shared::RecyclerConfig;

fn pool_config() -> RecyclerConfig {
    RecyclerConfig {
        default_capacity: 64,
        minimum_capacity: 16,
        expand_threshold: 0.75,
        expand_scale: 1.0,
        shrink_threshold: 0.3,
        shrink_scale: 0.5,
        shrink_delay: Duration::from_secs(60),
    }
}

async fn settle(pool: &Recycler<Package>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.is_expanding() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_concurrent_acquires_expand_once() {
    let pool = Recycler::with_current(pool_config(), Package::default).expect("pool");
    pool.init(64);

    let barrier = Arc::new(Barrier::new(50));
    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let pool = pool.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                pool.acquire().expect("initialized")
            })
        })
        .collect();

    let mut held = Vec::with_capacity(50);
    for task in tasks {
        held.push(task.await.expect("acquire task"));
    }

    assert_eq!(pool.usage(), 50);
    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.stats().expansions == 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    settle(&pool).await;

    let stats = pool.stats();
    assert_eq!(stats.expansions, 1);
    assert_eq!(stats.capacity, 128);
    assert_eq!(stats.capacity, stats.idle + stats.usage);

    // 새 용량의 75%(96) 미만에서는 추가 확장 없음
    let more: Vec<_> = (0..40)
        .map(|_| pool.acquire().expect("initialized"))
        .collect();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pool.stats().expansions, 1);

    drop(more);
    drop(held);
    assert_eq!(pool.usage(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_invariant_under_concurrent_traffic() {
    let pool = Recycler::with_current(pool_config(), Package::default).expect("pool");
    pool.init(64);

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let pool = pool.clone();
            tokio::spawn(async move {
                for round in 0..200u32 {
                    let mut pkg = pool.acquire().expect("initialized");
                    pkg.set_id(1001 + worker).set_data(round.to_be_bytes());
                    assert!(pkg.has_valid_id());
                    assert!(!pkg.is_unused());
                    if round % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.await.expect("worker");
    }
    settle(&pool).await;

    let stats = pool.stats();
    assert_eq!(stats.usage, 0);
    assert_eq!(stats.capacity, stats.idle + stats.usage);
    assert!(stats.capacity >= 64);
}

#[tokio::test]
async fn test_recycled_package_is_clean() {
    let header = PackageHeader::default();
    let config = RecyclerConfig {
        minimum_capacity: 1,
        ..pool_config()
    };
    let pool =
        Recycler::with_current(config, move || Package::with_header(header)).expect("pool");
    pool.init(1);

    let mut pkg = pool.acquire().expect("initialized");
    pkg.set_id(5000).set_version(99).set_data("stale");
    assert!(!pkg.is_unused());
    pool.recycle(pkg);

    let pkg = pool.acquire().expect("initialized");
    assert!(pkg.is_unused());
    assert!(pkg.data().is_empty());
    assert!(!pkg.has_valid_id());
    assert_eq!(pkg.version(), header.version);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let config = RecyclerConfig {
        expand_threshold: 0.2,
        ..pool_config()
    };
    assert!(Recycler::with_current(config, Package::default).is_err());
}

#[tokio::test]
async fn test_init_never_goes_below_minimum() {
    let pool = Recycler::with_current(pool_config(), Package::default).expect("pool");
    pool.init(4);

    let stats = pool.stats();
    assert!(stats.capacity >= pool.config().minimum_capacity);
    assert_eq!(stats.capacity, 16);
    assert_eq!(stats.capacity, stats.idle + stats.usage);
}

#[test]
fn test_requires_runtime() {
    assert!(Recycler::with_current(pool_config(), Package::default).is_err());
}
