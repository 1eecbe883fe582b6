//! 전역 큐 통합 테스트
//!
//! 순서 보장, 패스 경계 지연, 대기 중 제거, 상호 배제, 처리 비율을 검증합니다.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use uranus_shared::config::scheduler::BASE_RATE;
use uranus_shared::reactor::{GlobalQueue, QueueState, Reactor, ReactorHandle};
use uranus_shared::SchedulerConfig;

#[derive(Default)]
struct Journal {
    entries: Vec<&'static str>,
}

impl Reactor for Journal {}

fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

fn entries(handle: &ReactorHandle<Journal>) -> Vec<&'static str> {
    let (tx, rx) = mpsc::channel();
    handle.push_task(move |journal| {
        let _ = tx.send(journal.entries.clone());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("journal snapshot")
}

fn config(workers: usize, batch_rate: u32) -> SchedulerConfig {
    SchedulerConfig {
        worker_threads: workers,
        batch_rate,
        max_pass_duration: Duration::from_secs(3),
    }
}

#[test]
fn test_idle_queue_drains_in_order_in_one_pass() {
    let global = GlobalQueue::new(config(2, BASE_RATE)).expect("config");
    let handle = global.register_reactor(Journal::default());
    assert_eq!(handle.state(), QueueState::Idle);

    for tag in ["A", "B", "C"] {
        handle.push_task(move |j| j.entries.push(tag));
    }
    assert_eq!(handle.state(), QueueState::Queued);

    global.start().expect("start");
    assert!(wait_until(|| global.stats().executed == 3));
    assert!(wait_until(|| handle.state() == QueueState::Idle));
    assert_eq!(global.stats().passes, 1);

    assert_eq!(entries(&handle), vec!["A", "B", "C"]);
}

#[test]
fn test_push_during_pass_lands_in_next_pass() {
    let global = GlobalQueue::new(config(1, BASE_RATE)).expect("config");
    global.start().expect("start");
    let handle = global.register_reactor(Journal::default());

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    handle.push_task(move |j| {
        j.entries.push("A");
        let _ = started_tx.send(());
        let _ = release_rx.recv_timeout(Duration::from_secs(5));
    });
    handle.push_task(|j| j.entries.push("B"));

    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first task started");
    assert_eq!(handle.state(), QueueState::Running);

    handle.push_task(|j| j.entries.push("D"));
    assert_eq!(handle.pending(), 2);

    release_tx.send(()).expect("release");
    assert!(wait_until(|| global.stats().executed == 3));
    assert!(global.stats().passes >= 2);

    assert_eq!(entries(&handle), vec!["A", "B", "D"]);
}

#[test]
fn test_removed_while_queued_never_runs() {
    let global = GlobalQueue::new(config(1, BASE_RATE)).expect("config");
    global.start().expect("start");

    let blocker = global.register_reactor(Journal::default());
    let victim = global.register_reactor(Journal::default());
    let ran = Arc::new(AtomicBool::new(false));

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    blocker.push_task(move |_| {
        let _ = started_tx.send(());
        let _ = release_rx.recv_timeout(Duration::from_secs(5));
    });
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("blocker running");

    for _ in 0..3 {
        let ran = Arc::clone(&ran);
        victim.push_task(move |_| ran.store(true, Ordering::SeqCst));
    }
    assert_eq!(victim.state(), QueueState::Queued);

    let victim_id = victim.id();
    assert!(global.remove_reactor(victim_id));
    assert_eq!(victim.state(), QueueState::Removed);

    release_tx.send(()).expect("release");
    assert!(wait_until(|| global.stats().discarded >= 1));
    assert!(!ran.load(Ordering::SeqCst));

    let before = victim.pending();
    victim.push_task(|j| j.entries.push("late"));
    assert_eq!(victim.pending(), before);
}

#[test]
fn test_one_worker_per_queue_at_a_time() {
    const REACTORS: usize = 6;
    const PRODUCERS: usize = 4;
    const TASKS_PER_PRODUCER: usize = 100;

    struct Guarded {
        inside: Arc<AtomicBool>,
    }
    impl Reactor for Guarded {}

    let global = GlobalQueue::new(config(4, BASE_RATE / 4)).expect("config");
    global.start().expect("start");

    let violations = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..REACTORS)
        .map(|_| {
            global.register_reactor(Guarded {
                inside: Arc::new(AtomicBool::new(false)),
            })
        })
        .collect();
    let refs: Vec<_> = handles.iter().map(|h| h.downgrade()).collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let refs = refs.clone();
            let violations = Arc::clone(&violations);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for i in 0..TASKS_PER_PRODUCER {
                    let violations = Arc::clone(&violations);
                    let done = Arc::clone(&done);
                    refs[i % REACTORS].push_task(move |g: &mut Guarded| {
                        if g.inside.swap(true, Ordering::SeqCst) {
                            violations.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::sleep(Duration::from_micros(50));
                        g.inside.store(false, Ordering::SeqCst);
                        done.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().expect("producer");
    }

    let total = PRODUCERS * TASKS_PER_PRODUCER;
    assert!(wait_until(|| done.load(Ordering::SeqCst) == total));
    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert!(wait_until(|| handles
        .iter()
        .all(|h| h.state() == QueueState::Idle)));
}

#[test]
fn test_low_rate_spreads_backlog_over_passes() {
    let global = GlobalQueue::new(config(1, 1)).expect("config");
    let handle = global.register_reactor(Journal::default());

    for tag in ["1", "2", "3", "4", "5"] {
        handle.push_task(move |j| j.entries.push(tag));
    }

    global.start().expect("start");
    assert!(wait_until(|| global.stats().executed == 5));
    assert_eq!(global.stats().passes, 5);
    assert_eq!(entries(&handle), vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn test_panicking_task_does_not_kill_worker() {
    let global = GlobalQueue::new(config(1, BASE_RATE)).expect("config");
    global.start().expect("start");
    let handle = global.register_reactor(Journal::default());

    handle.push_task(|_| panic!("task failure"));
    handle.push_task(|j| j.entries.push("survived"));

    assert!(wait_until(|| global.stats().panicked == 1));
    assert_eq!(entries(&handle), vec!["survived"]);
}

#[test]
fn test_find_queue_and_push_through_ref() {
    let global = GlobalQueue::new(config(2, BASE_RATE)).expect("config");
    global.start().expect("start");
    let handle = global.register_reactor(Journal::default());

    let found = global
        .find_queue::<Journal>(handle.id())
        .expect("registered queue");
    found.push_task(|j| j.entries.push("via-ref"));

    assert_eq!(entries(&handle), vec!["via-ref"]);
}

#[test]
fn test_shutdown_is_idempotent_and_stops_work() {
    let global = GlobalQueue::new(config(2, BASE_RATE)).expect("config");
    global.start().expect("start");
    let handle = global.register_reactor(Journal::default());

    global.shutdown();
    global.shutdown();
    assert!(!global.is_running());

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    handle.push_task(move |_| flag.store(true, Ordering::SeqCst));

    thread::sleep(Duration::from_millis(50));
    assert!(!ran.load(Ordering::SeqCst));
}
