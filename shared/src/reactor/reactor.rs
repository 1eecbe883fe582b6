//! 리액터와 핸들
//!
//! 리액터는 직렬 실행 단위입니다 (매니저, 플레이어 에이전트 등).
//! 리액터 상태는 작업 클로저 안에서만 변경되며, 같은 리액터의 작업은
//! 동시에 두 워커에서 실행되지 않습니다.

use super::task_queue::{QueueId, QueueState, Task, TaskQueue};
use bytes::Bytes;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 직렬 실행 단위
pub trait Reactor: Send + 'static {
    /// 외부에서 이름으로 호출되는 진입점
    ///
    /// 기본 구현은 알 수 없는 메서드로 보고 무시합니다.
    fn invoke(&mut self, method: &str, payload: &[u8]) {
        debug!(
            "처리되지 않은 invoke 무시: {} ({} bytes)",
            method,
            payload.len()
        );
    }
}

fn invoke_task<R: Reactor>(method: String, payload: Bytes) -> Task<R> {
    Box::new(move |reactor: &mut R| reactor.invoke(&method, &payload))
}

/// 리액터 작업 큐의 소유 핸들
///
/// 작업 큐의 유일한 강한 참조입니다. drop되면 큐가 제거되고
/// 전역 큐의 레지스트리와 유휴 집합에서 빠집니다.
pub struct ReactorHandle<R: Reactor> {
    queue: Arc<TaskQueue<R>>,
}

impl<R: Reactor> ReactorHandle<R> {
    pub(crate) fn new(queue: Arc<TaskQueue<R>>) -> Self {
        Self { queue }
    }

    pub fn id(&self) -> QueueId {
        self.queue.id()
    }

    pub fn state(&self) -> QueueState {
        self.queue.state()
    }

    /// 대기 중인 작업 수
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// 작업 추가
    pub fn push_task<F>(&self, task: F)
    where
        F: FnOnce(&mut R) + Send + 'static,
    {
        self.queue.push(Box::new(task));
    }

    /// `Reactor::invoke`를 호출하는 작업 추가
    pub fn invoke(&self, method: impl Into<String>, payload: impl Into<Bytes>) {
        self.queue.push(invoke_task(method.into(), payload.into()));
    }

    /// 수명을 늘리지 않는 참조 생성
    pub fn downgrade(&self) -> TaskQueueRef<R> {
        TaskQueueRef::new(self.queue.id(), Arc::downgrade(&self.queue))
    }

    /// 명시적 제거 (drop과 동일)
    pub fn remove(self) {
        drop(self);
    }
}

impl<R: Reactor> fmt::Debug for ReactorHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorHandle")
            .field("queue", &self.queue)
            .finish()
    }
}

impl<R: Reactor> Drop for ReactorHandle<R> {
    fn drop(&mut self) {
        if self.queue.remove() {
            debug!("{} 핸들 해제", self.queue.id());
        }
    }
}

/// 작업 큐의 비소유 참조
///
/// 리액터가 이미 해제되었으면 모든 호출이 조용히 무시됩니다.
pub struct TaskQueueRef<R: Reactor> {
    id: QueueId,
    queue: Weak<TaskQueue<R>>,
}

impl<R: Reactor> Clone for TaskQueueRef<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            queue: Weak::clone(&self.queue),
        }
    }
}

impl<R: Reactor> TaskQueueRef<R> {
    pub(crate) fn new(id: QueueId, queue: Weak<TaskQueue<R>>) -> Self {
        Self { id, queue }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.queue
            .upgrade()
            .is_some_and(|q| q.state() != QueueState::Removed)
    }

    /// 해제되었으면 `Removed`
    pub fn state(&self) -> QueueState {
        self.queue
            .upgrade()
            .map(|q| q.state())
            .unwrap_or(QueueState::Removed)
    }

    pub fn push_task<F>(&self, task: F)
    where
        F: FnOnce(&mut R) + Send + 'static,
    {
        match self.queue.upgrade() {
            Some(queue) => queue.push(Box::new(task)),
            None => debug!("{} 해제된 리액터에 작업 추가 무시", self.id),
        }
    }

    pub fn invoke(&self, method: impl Into<String>, payload: impl Into<Bytes>) {
        match self.queue.upgrade() {
            Some(queue) => queue.push(invoke_task(method.into(), payload.into())),
            None => debug!("{} 해제된 리액터에 invoke 무시", self.id),
        }
    }
}

impl<R: Reactor> fmt::Debug for TaskQueueRef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueueRef")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
