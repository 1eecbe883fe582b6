//! 전역 큐 (워커 스레드 풀)
//!
//! 고정 크기의 워커 스레드가 하나의 준비 큐를 공유합니다.
//! 워커는 준비된 작업 큐를 꺼내 제한된 패스를 실행한 뒤,
//! 남은 작업이 있으면 준비 큐로, 없으면 유휴 집합으로 되돌립니다.
//!
//! 레지스트리와 유휴 집합은 `QueueId`를 키로 약한 참조만 보관합니다.
//! 작업 큐의 수명은 `ReactorHandle`이 결정합니다.
//!
//! # 사용 예시
//! ```rust,no_run
//! use uranus_shared::config::SchedulerConfig;
//! use uranus_shared::reactor::{GlobalQueue, Reactor};
//!
//! struct Counter(u64);
//! impl Reactor for Counter {}
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let global = GlobalQueue::new(SchedulerConfig::with_workers(2))?;
//! global.start()?;
//!
//! let counter = global.register_reactor(Counter(0));
//! counter.push_task(|c| c.0 += 1);
//! # Ok(())
//! # }
//! ```

use super::ready_queue::ReadyQueue;
use super::reactor::{Reactor, ReactorHandle, TaskQueueRef};
use super::task_queue::{PassOutcome, QueueId, Schedulable, TaskQueue};
use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

type QueueWeak = Weak<dyn Schedulable>;

struct RegistryEntry {
    queue: QueueWeak,
    typed: Weak<dyn Any + Send + Sync>,
}

#[derive(Debug, Default)]
struct SchedulerCounters {
    passes: AtomicU64,
    executed: AtomicU64,
    panicked: AtomicU64,
    discarded: AtomicU64,
}

/// 전역 큐 통계 스냅샷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub registered: usize,
    pub idle: usize,
    pub ready: usize,
    pub workers: usize,
    pub passes: u64,
    pub executed: u64,
    /// 패닉으로 끝난 작업 수
    pub panicked: u64,
    /// 제거되었거나 해제된 뒤 준비 큐에서 꺼내져 버려진 횟수
    pub discarded: u64,
}

/// 작업 큐와 워커가 공유하는 상태
pub(crate) struct Shared {
    config: SchedulerConfig,
    registry: RwLock<HashMap<QueueId, RegistryEntry>>,
    idle: Mutex<HashMap<QueueId, QueueWeak>>,
    ready: ReadyQueue<QueueWeak>,
    counters: SchedulerCounters,
}

impl Shared {
    /// 유휴 상태인 큐를 준비 큐로 옮기고 워커를 깨웁니다.
    ///
    /// 유휴 집합에 없으면 (이미 대기 중이거나 실행 중) 아무 것도 하지 않습니다.
    pub(crate) fn notify(&self, id: QueueId) {
        let Some(weak) = self.idle.lock().remove(&id) else {
            return;
        };

        match weak.upgrade() {
            Some(queue) if !queue.is_removed() => {
                queue.mark_queued();
                if self.ready.push(weak) {
                    debug!("{} 유휴 -> 대기", id);
                } else {
                    queue.clear_queued();
                    debug!("{} 전역 큐가 종료되어 깨우기 무시", id);
                }
            }
            _ => debug!("{} 해제된 큐 깨우기 무시", id),
        }
    }

    /// 비워진 큐를 유휴 집합에 넣습니다.
    ///
    /// 넣은 직후 다시 검사해, 그 사이 들어온 작업이 있으면 바로 깨웁니다.
    fn park(&self, queue: &Arc<dyn Schedulable>, weak: QueueWeak) {
        let id = queue.id();
        self.idle.lock().insert(id, weak);

        if queue.is_removed() {
            self.idle.lock().remove(&id);
            return;
        }

        if queue.has_pending() {
            self.notify(id);
        }
    }

    /// 핸들 drop 경로
    pub(crate) fn remove(&self, id: QueueId) {
        if self.deregister(id) {
            debug!("{} 핸들 해제로 제거", id);
        }
    }

    fn deregister(&self, id: QueueId) -> bool {
        let existed = self.registry.write().remove(&id).is_some();
        self.idle.lock().remove(&id);
        existed
    }

    fn worker_loop(&self, index: usize) {
        info!("워커 {} 시작", index);

        while let Some(weak) = self.ready.pop_blocking() {
            let Some(queue) = weak.upgrade() else {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                continue;
            };

            if queue.is_removed() {
                debug!("{} 제거된 큐 폐기", queue.id());
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            queue.on_pop_from_global();
            let report = queue.run_pass(self.config.batch_rate, self.config.max_pass_duration);

            self.counters.passes.fetch_add(1, Ordering::Relaxed);
            self.counters
                .executed
                .fetch_add(report.executed as u64, Ordering::Relaxed);
            self.counters
                .panicked
                .fetch_add(report.panicked as u64, Ordering::Relaxed);

            match report.outcome {
                PassOutcome::Pending => {
                    queue.mark_queued();
                    if !self.ready.push(weak) {
                        queue.clear_queued();
                        debug!("{} 전역 큐가 종료되어 재대기 취소", queue.id());
                    }
                }
                PassOutcome::Drained => self.park(&queue, weak),
                PassOutcome::Removed => debug!("{} 패스 후 제거 확인", queue.id()),
            }
        }

        info!("워커 {} 종료", index);
    }
}

/// 전역 큐
pub struct GlobalQueue {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    shut_down: AtomicBool,
}

impl GlobalQueue {
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                registry: RwLock::new(HashMap::new()),
                idle: Mutex::new(HashMap::new()),
                ready: ReadyQueue::new(),
                counters: SchedulerCounters::default(),
            }),
            workers: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        })
    }

    /// 환경변수 설정으로 생성
    pub fn from_env() -> SchedulerResult<Self> {
        Self::new(SchedulerConfig::from_env()?)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// 워커 스레드 시작
    pub fn start(&self) -> SchedulerResult<()> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(SchedulerError::ShutDown);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyStarted);
        }

        let count = self.shared.config.worker_threads;
        let mut workers = self.workers.lock();

        for index in 0..count {
            let name = format!("uranus-worker-{}", index);
            let shared = Arc::clone(&self.shared);

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || shared.worker_loop(index))
                .map_err(|source| SchedulerError::WorkerSpawn { name, source })?;

            workers.push(handle);
        }

        info!("전역 큐 시작 - 워커 {}개", count);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.shut_down.load(Ordering::Acquire)
    }

    /// 리액터 등록
    ///
    /// 새 작업 큐는 유휴 상태로 시작합니다. 반환된 핸들이 큐의 유일한
    /// 소유자이며, 핸들이 drop되면 큐가 제거됩니다.
    pub fn register_reactor<R: Reactor>(&self, reactor: R) -> ReactorHandle<R> {
        let queue = Arc::new(TaskQueue::new(reactor, Arc::downgrade(&self.shared)));
        let id = queue.id();

        let schedulable: Arc<dyn Schedulable> = queue.clone();
        let typed: Arc<dyn Any + Send + Sync> = queue.clone();
        let weak = Arc::downgrade(&schedulable);

        self.shared.registry.write().insert(
            id,
            RegistryEntry {
                queue: weak.clone(),
                typed: Arc::downgrade(&typed),
            },
        );
        self.shared.idle.lock().insert(id, weak);

        if self.shut_down.load(Ordering::Acquire) {
            warn!("{} 종료된 전역 큐에 등록됨, 작업이 실행되지 않습니다", id);
        } else {
            debug!("{} 등록", id);
        }

        ReactorHandle::new(queue)
    }

    /// 등록된 큐를 찾아 비소유 참조로 반환
    ///
    /// 리액터 타입이 다르거나 이미 해제되었으면 `None`.
    pub fn find_queue<R: Reactor>(&self, id: QueueId) -> Option<TaskQueueRef<R>> {
        let typed = self.shared.registry.read().get(&id)?.typed.upgrade()?;
        let queue = typed.downcast::<TaskQueue<R>>().ok()?;
        Some(TaskQueueRef::new(id, Arc::downgrade(&queue)))
    }

    /// 리액터 제거
    ///
    /// 큐를 제거 상태로 표시하고 레지스트리와 유휴 집합에서 뺍니다.
    /// 이미 제거되었으면 `false`.
    pub fn remove_reactor(&self, id: QueueId) -> bool {
        let queue = self
            .shared
            .registry
            .read()
            .get(&id)
            .and_then(|entry| entry.queue.upgrade());

        let marked = queue.map(|q| q.mark_removed()).unwrap_or(false);
        let existed = self.shared.deregister(id);

        if marked || existed {
            debug!("{} 제거", id);
            true
        } else {
            debug!("{} 이미 제거된 리액터", id);
            false
        }
    }

    /// 큐 깨우기 (보통 `push_task`가 내부적으로 호출)
    pub fn notify(&self, id: QueueId) {
        self.shared.notify(id);
    }

    pub fn stats(&self) -> SchedulerStats {
        let counters = &self.shared.counters;
        SchedulerStats {
            registered: self.shared.registry.read().len(),
            idle: self.shared.idle.lock().len(),
            ready: self.shared.ready.len(),
            workers: self.workers.lock().len(),
            passes: counters.passes.load(Ordering::Relaxed),
            executed: counters.executed.load(Ordering::Relaxed),
            panicked: counters.panicked.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
        }
    }

    /// 모든 워커를 깨워 종료시키고 합류합니다. 여러 번 호출해도 안전합니다.
    ///
    /// 실행 중인 패스는 끝까지 진행되며, 준비 큐에 남은 항목은 버려집니다.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let dropped = self.shared.ready.close();
        for queue in dropped.iter().filter_map(Weak::upgrade) {
            queue.clear_queued();
        }
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let current = thread::current().id();

        for handle in workers {
            if handle.thread().id() == current {
                warn!("워커 스레드 내부에서 종료 요청, 자기 자신은 합류하지 않음");
                continue;
            }
            if handle.join().is_err() {
                warn!("워커 스레드 합류 실패");
            }
        }

        info!("전역 큐 종료 - 대기 중이던 큐 {}개 폐기", dropped.len());
    }
}

impl Drop for GlobalQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
