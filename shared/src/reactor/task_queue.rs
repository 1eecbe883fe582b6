//! 리액터별 작업 큐 (메일박스)
//!
//! 작업은 두 개의 버퍼에 쌓입니다.
//! - `current`: 다음 패스에서 처리할 작업
//! - `waiting`: 패스 실행 중에 들어온 작업 (다음 패스로 미뤄짐)
//!
//! 패스가 끝나면 `waiting`을 `current` 뒤에 이어 붙여 제출 순서를 유지합니다.
//! 버퍼와 `running` 플래그는 큐 자체의 락으로 보호되며 전역 큐의 락과는
//! 별개입니다.

use super::global_queue::Shared;
use super::reactor::Reactor;
use crate::config::scheduler::BASE_RATE;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Weak;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

static QUEUE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 리액터에서 실행될 작업
pub type Task<R> = Box<dyn FnOnce(&mut R) + Send + 'static>;

/// 등록 시 부여되는 고정 큐 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueId(u64);

impl QueueId {
    pub(crate) fn next() -> Self {
        Self(QUEUE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue-{}", self.0)
    }
}

/// 작업 큐 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueState {
    /// 대기 작업 없음, 전역 큐의 유휴 집합에 있음
    Idle,
    /// 준비 큐에서 워커를 기다리는 중
    Queued,
    /// 워커 하나가 패스를 실행 중
    Running,
    /// 제거됨 (종료 상태)
    Removed,
}

/// 패스 종료 후 큐를 어디로 보낼지
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassOutcome {
    /// 남은 작업이 있어 준비 큐로 돌아감
    Pending,
    /// 비었으므로 유휴 집합으로
    Drained,
    Removed,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PassReport {
    pub outcome: PassOutcome,
    pub executed: usize,
    pub panicked: usize,
}

/// 전역 큐가 리액터 타입을 모른 채 다루는 인터페이스
pub(crate) trait Schedulable: Send + Sync {
    fn id(&self) -> QueueId;
    fn is_removed(&self) -> bool;
    fn mark_removed(&self) -> bool;
    fn has_pending(&self) -> bool;
    /// 준비 큐에 넣기 직전 호출
    fn mark_queued(&self);
    /// 준비 큐가 닫혀 넣지 못했거나 넣은 항목이 버려졌을 때 호출
    fn clear_queued(&self);
    /// 워커가 준비 큐에서 꺼낸 직후 호출
    fn on_pop_from_global(&self);
    fn run_pass(&self, batch_rate: u32, max_pass: Duration) -> PassReport;
}

struct Buffers<R> {
    current: VecDeque<Task<R>>,
    waiting: VecDeque<Task<R>>,
}

/// 리액터 하나의 메일박스
///
/// 리액터 상태는 큐가 소유하며 패스를 실행하는 워커만 접근합니다.
/// 한 번에 하나의 워커만 패스를 실행하므로 리액터 락은 경합하지 않습니다.
pub struct TaskQueue<R: Reactor> {
    id: QueueId,
    global: Weak<Shared>,
    reactor: Mutex<R>,
    buffers: Mutex<Buffers<R>>,
    running: AtomicBool,
    in_global: AtomicBool,
    removed: AtomicBool,
}

impl<R: Reactor> TaskQueue<R> {
    pub(crate) fn new(reactor: R, global: Weak<Shared>) -> Self {
        Self {
            id: QueueId::next(),
            global,
            reactor: Mutex::new(reactor),
            buffers: Mutex::new(Buffers {
                current: VecDeque::new(),
                waiting: VecDeque::new(),
            }),
            running: AtomicBool::new(false),
            in_global: AtomicBool::new(false),
            removed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn state(&self) -> QueueState {
        if self.removed.load(Ordering::Acquire) {
            QueueState::Removed
        } else if self.running.load(Ordering::Acquire) {
            QueueState::Running
        } else if self.in_global.load(Ordering::Acquire) {
            QueueState::Queued
        } else {
            QueueState::Idle
        }
    }

    /// 대기 중인 작업 수 (current + waiting)
    pub fn len(&self) -> usize {
        let buffers = self.buffers.lock();
        buffers.current.len() + buffers.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 작업 추가
    ///
    /// 실행 중이면 다음 패스로 미루고, 아니면 현재 버퍼에 넣은 뒤
    /// 전역 큐에 깨우기를 요청합니다. 제거된 큐로의 추가는 무시됩니다.
    pub(crate) fn push(&self, task: Task<R>) {
        if self.removed.load(Ordering::Acquire) {
            debug!("{} 제거된 큐에 작업 추가 무시", self.id);
            return;
        }

        let deferred = {
            let mut buffers = self.buffers.lock();
            if self.running.load(Ordering::Acquire) {
                buffers.waiting.push_back(task);
                true
            } else {
                buffers.current.push_back(task);
                false
            }
        };

        if deferred {
            trace!("{} 실행 중, 작업을 다음 패스로 미룸", self.id);
            return;
        }

        if let Some(global) = self.global.upgrade() {
            global.notify(self.id);
        }
    }

    /// 제거 상태로 표시하고 전역 큐의 장부에서 뺍니다. 처음 제거될 때만 `true`.
    pub(crate) fn remove(&self) -> bool {
        let first = !self.removed.swap(true, Ordering::AcqRel);
        if let Some(global) = self.global.upgrade() {
            global.remove(self.id);
        }
        first
    }

    fn execute(&self, reactor: &mut R, task: Task<R>) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| task(reactor))) {
            Ok(()) => true,
            Err(cause) => {
                let message = cause
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "알 수 없는 패닉".to_string());
                error!("{} 작업 실행 중 패닉 발생: {}", self.id, message);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn with_reactor<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&*self.reactor.lock())
    }
}

impl<R: Reactor> Schedulable for TaskQueue<R> {
    fn id(&self) -> QueueId {
        self.id
    }

    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// 처음 제거될 때만 `true`
    fn mark_removed(&self) -> bool {
        !self.removed.swap(true, Ordering::AcqRel)
    }

    fn has_pending(&self) -> bool {
        !self.buffers.lock().current.is_empty()
    }

    fn mark_queued(&self) {
        self.in_global.store(true, Ordering::Release);
    }

    fn clear_queued(&self) {
        self.in_global.store(false, Ordering::Release);
    }

    fn on_pop_from_global(&self) {
        let _buffers = self.buffers.lock();
        self.in_global.store(false, Ordering::Release);
        self.running.store(true, Ordering::Release);
    }

    /// 한 번의 패스 실행
    ///
    /// 현재 버퍼의 `ceil(len * batch_rate / BASE_RATE)`개까지만 처리하고,
    /// 제거되었거나 `max_pass`를 넘기면 중단합니다.
    fn run_pass(&self, batch_rate: u32, max_pass: Duration) -> PassReport {
        let started = Instant::now();
        let backlog = self.buffers.lock().current.len();
        let budget = (backlog as u64 * batch_rate as u64).div_ceil(BASE_RATE as u64) as usize;

        let mut executed = 0;
        let mut panicked = 0;

        {
            let mut reactor = self.reactor.lock();

            while executed + panicked < budget {
                if self.removed.load(Ordering::Acquire) {
                    debug!("{} 패스 도중 제거 감지, 중단", self.id);
                    break;
                }

                let Some(task) = self.buffers.lock().current.pop_front() else {
                    break;
                };

                if self.execute(&mut *reactor, task) {
                    executed += 1;
                } else {
                    panicked += 1;
                }

                if started.elapsed() >= max_pass {
                    warn!(
                        "{} 패스 시간 초과 ({:?}), {}/{} 처리 후 양보",
                        self.id,
                        started.elapsed(),
                        executed + panicked,
                        budget
                    );
                    break;
                }
            }
        }

        let (outcome, discarded) = {
            let mut buffers = self.buffers.lock();
            self.running.store(false, Ordering::Release);

            let waiting = std::mem::take(&mut buffers.waiting);
            buffers.current.extend(waiting);

            if self.removed.load(Ordering::Acquire) {
                (PassOutcome::Removed, std::mem::take(&mut buffers.current))
            } else if buffers.current.is_empty() {
                (PassOutcome::Drained, VecDeque::new())
            } else {
                (PassOutcome::Pending, VecDeque::new())
            }
        };

        if !discarded.is_empty() {
            debug!("{} 제거된 큐의 작업 {}개 폐기", self.id, discarded.len());
        }
        drop(discarded);

        trace!(
            "{} 패스 완료 - 실행 {}, 패닉 {}, 결과 {:?}",
            self.id,
            executed,
            panicked,
            outcome
        );

        PassReport {
            outcome,
            executed,
            panicked,
        }
    }
}

impl<R: Reactor> fmt::Debug for TaskQueue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("pending", &self.len())
            .finish()
    }
}
