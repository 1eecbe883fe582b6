//! 워커 스레드용 블로킹 대기열

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct ReadyInner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// 여러 워커가 공유하는 준비 큐
///
/// `pop_blocking`은 항목이 생기거나 큐가 닫힐 때까지 대기합니다.
/// 닫힌 뒤에는 남은 항목과 관계없이 `None`을 반환합니다.
pub(crate) struct ReadyQueue<T> {
    inner: Mutex<ReadyInner<T>>,
    cond: Condvar,
}

impl<T> ReadyQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(ReadyInner {
                items: VecDeque::new(),
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// 항목 추가 후 워커 하나를 깨웁니다. 닫힌 큐면 `false`.
    pub(crate) fn push(&self, item: T) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return false;
            }
            inner.items.push_back(item);
        }
        self.cond.notify_one();
        true
    }

    pub(crate) fn pop_blocking(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                return None;
            }
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            self.cond.wait(&mut inner);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// 큐를 닫고 대기 중인 모든 워커를 깨웁니다. 남아 있던 항목을 돌려줍니다.
    pub(crate) fn close(&self) -> VecDeque<T> {
        let dropped = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            std::mem::take(&mut inner.items)
        };
        self.cond.notify_all();
        dropped
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
