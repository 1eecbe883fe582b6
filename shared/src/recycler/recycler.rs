//! 적응형 재활용 풀
//!
//! 사용률에 따라 용량을 늘리거나 줄이는 객체 풀입니다.
//! - `acquire`는 자동 반환 핸들(`Pooled`)을 돌려주며, 핸들이 drop되면 풀로 돌아옵니다.
//! - 사용률이 확장 임계값을 넘으면 백그라운드에서 한 번 확장합니다.
//! - 반환 후 일정 시간이 지나면 수축 여부를 검사합니다 (타이머는 하나만 유지).
//!
//! 확장과 수축은 tokio 런타임에 위임되며 `acquire`/`recycle` 호출 경로에서
//! 동기적으로 실행되지 않습니다.
//!
//! 불변식: `capacity == idle + usage`, `capacity >= minimum_capacity`.

use super::recyclable::{RecycleState, Recyclable};
use crate::config::RecyclerConfig;
use crate::error::RecyclerResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

static RECYCLER_COUNTER: AtomicU64 = AtomicU64::new(1);

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// 대기 중인 수축 타이머
struct ShrinkTimer {
    seq: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct RecyclerCounters {
    created: AtomicU64,
    discarded: AtomicU64,
    expansions: AtomicU64,
    shrinks: AtomicU64,
}

struct RecyclerInner<T: Recyclable> {
    id: u64,
    config: RecyclerConfig,
    factory: Factory<T>,
    runtime: Handle,

    queue: Mutex<VecDeque<T>>,
    usage: AtomicUsize,
    initialized: AtomicBool,

    expanding: AtomicBool,
    shrink_timer: Mutex<Option<ShrinkTimer>>,
    shrink_seq: AtomicU64,

    counters: RecyclerCounters,
}

/// 재활용 풀 통계 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecyclerStats {
    pub capacity: usize,
    pub usage: usize,
    pub idle: usize,
    /// 풀이 생성한 전체 객체 수
    pub created: u64,
    /// 수축으로 폐기된 객체 수
    pub discarded: u64,
    pub expansions: u64,
    pub shrinks: u64,
    pub expanding: bool,
    pub shrink_pending: bool,
}

impl RecyclerStats {
    pub fn usage_ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.usage as f64 / self.capacity as f64
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 적응형 재활용 풀
///
/// 복제하면 같은 풀을 공유합니다.
pub struct Recycler<T: Recyclable> {
    inner: Arc<RecyclerInner<T>>,
}

impl<T: Recyclable> Clone for Recycler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Recyclable> fmt::Debug for Recycler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recycler")
            .field("id", &self.inner.id)
            .field("capacity", &self.capacity())
            .field("usage", &self.usage())
            .finish()
    }
}

impl<T: Recyclable> Recycler<T> {
    /// 새로운 재활용 풀 생성
    ///
    /// 확장/수축 작업은 `runtime`에서 실행됩니다. 생성 직후에는 비어 있으며
    /// `init`을 호출하기 전까지 `acquire`는 `None`을 반환합니다.
    pub fn new<F>(config: RecyclerConfig, runtime: Handle, factory: F) -> RecyclerResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(RecyclerInner {
                id: RECYCLER_COUNTER.fetch_add(1, Ordering::Relaxed),
                config,
                factory: Box::new(factory),
                runtime,
                queue: Mutex::new(VecDeque::new()),
                usage: AtomicUsize::new(0),
                initialized: AtomicBool::new(false),
                expanding: AtomicBool::new(false),
                shrink_timer: Mutex::new(None),
                shrink_seq: AtomicU64::new(0),
                counters: RecyclerCounters::default(),
            }),
        })
    }

    /// 현재 tokio 런타임을 사용하는 재활용 풀 생성
    pub fn with_current<F>(config: RecyclerConfig, factory: F) -> RecyclerResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let runtime = Handle::try_current()?;
        Self::new(config, runtime, factory)
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn config(&self) -> &RecyclerConfig {
        &self.inner.config
    }

    /// 풀을 `capacity`개의 객체로 채웁니다. 두 번째 호출부터는 무시됩니다.
    ///
    /// `capacity`가 최소 용량보다 작으면 최소 용량까지 채웁니다.
    pub fn init(&self, capacity: usize) -> bool {
        let inner = &self.inner;
        let mut queue = inner.queue.lock();

        if inner.initialized.load(Ordering::Acquire) {
            debug!("Recycler[{}] 이미 초기화됨, init 무시", inner.id);
            return false;
        }

        let minimum = inner.config.minimum_capacity;
        if capacity < minimum {
            warn!(
                "Recycler[{}] 요청 용량 {}이 최소 용량 {}보다 작아 최소 용량으로 초기화",
                inner.id, capacity, minimum
            );
        }
        let capacity = capacity.max(minimum);

        queue.extend((0..capacity).map(|_| inner.create()));
        inner.initialized.store(true, Ordering::Release);

        debug!("Recycler[{}] 초기화 - 용량 {}", inner.id, capacity);
        true
    }

    /// 설정의 기본 용량으로 초기화
    pub fn init_default(&self) -> bool {
        self.init(self.inner.config.default_capacity)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    /// 풀에서 객체 하나를 꺼냅니다.
    ///
    /// 초기화 전이면 `None`을 반환합니다. 호출자는 이를 재시도 대상이 아닌
    /// 실패로 다뤄야 합니다.
    pub fn acquire(&self) -> Option<Pooled<T>> {
        let inner = &self.inner;

        if !inner.initialized.load(Ordering::Acquire) {
            warn!("Recycler[{}] 초기화 전 acquire 요청", inner.id);
            return None;
        }

        let popped = {
            let mut queue = inner.queue.lock();
            let elem = queue.pop_front();
            if elem.is_some() {
                inner.usage.fetch_add(1, Ordering::AcqRel);
            }
            elem
        };

        let mut elem = match popped {
            Some(elem) => {
                trace!("Recycler[{}] 대기열에서 객체 획득", inner.id);
                elem
            }
            None => {
                let elem = inner.create();
                inner.usage.fetch_add(1, Ordering::AcqRel);
                trace!("Recycler[{}] 대기열이 비어 새 객체 생성", inner.id);
                elem
            }
        };

        elem.initial();
        inner.check_expand();

        Some(Pooled {
            value: Some(elem),
            state: RecycleState::Unused,
            owner: inner.id,
            pool: Arc::downgrade(inner),
        })
    }

    /// 객체를 풀로 반환합니다.
    ///
    /// 다른 풀의 객체라면 이 풀은 아무 것도 하지 않으며, 객체는 원래 풀로 돌아갑니다.
    /// 대부분의 경우 핸들을 drop하는 것으로 충분합니다.
    pub fn recycle(&self, obj: Pooled<T>) {
        if obj.owner != self.inner.id {
            debug!(
                "Recycler[{}] 다른 풀(Recycler[{}])의 객체 반환 요청 무시",
                self.inner.id, obj.owner
            );
        }
        drop(obj);
    }

    /// 사용 중인 객체 수 (락 없이 읽음)
    pub fn usage(&self) -> usize {
        self.inner.usage.load(Ordering::Acquire)
    }

    /// 대기열의 객체 수
    pub fn idle(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// 전체 용량 (`idle + usage`)
    pub fn capacity(&self) -> usize {
        let queue = self.inner.queue.lock();
        queue.len() + self.inner.usage.load(Ordering::Acquire)
    }

    pub fn is_expanding(&self) -> bool {
        self.inner.expanding.load(Ordering::Acquire)
    }

    pub fn has_pending_shrink(&self) -> bool {
        self.inner.shrink_timer.lock().is_some()
    }

    pub fn stats(&self) -> RecyclerStats {
        let inner = &self.inner;
        let (idle, usage) = {
            let queue = inner.queue.lock();
            (queue.len(), inner.usage.load(Ordering::Acquire))
        };

        RecyclerStats {
            capacity: idle + usage,
            usage,
            idle,
            created: inner.counters.created.load(Ordering::Relaxed),
            discarded: inner.counters.discarded.load(Ordering::Relaxed),
            expansions: inner.counters.expansions.load(Ordering::Relaxed),
            shrinks: inner.counters.shrinks.load(Ordering::Relaxed),
            expanding: inner.expanding.load(Ordering::Acquire),
            shrink_pending: self.has_pending_shrink(),
        }
    }
}

impl<T: Recyclable> RecyclerInner<T> {
    fn create(&self) -> T {
        let mut elem = (self.factory)();
        elem.on_create();
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        elem
    }

    /// 사용률이 확장 임계값 이상이면 확장 작업을 예약합니다.
    fn check_expand(self: &Arc<Self>) {
        if self.expanding.load(Ordering::Acquire) {
            return;
        }

        let (usage, capacity) = {
            let queue = self.queue.lock();
            let usage = self.usage.load(Ordering::Acquire);
            (usage, queue.len() + usage)
        };

        if capacity == 0
            || (usage as f64) < capacity as f64 * self.config.expand_threshold as f64
        {
            return;
        }

        if self
            .expanding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        debug!(
            "Recycler[{}] 확장 예약 - 사용 {}/{}",
            self.id, usage, capacity
        );

        let weak = Arc::downgrade(self);
        self.runtime.spawn(async move {
            if let Some(inner) = weak.upgrade() {
                inner.expand();
            }
        });
    }

    fn expand(&self) {
        self.cancel_shrink();

        let total = {
            let queue = self.queue.lock();
            queue.len() + self.usage.load(Ordering::Acquire)
        };
        let added = (total as f64 * self.config.expand_scale as f64).ceil() as usize;

        let fresh: Vec<T> = (0..added).map(|_| self.create()).collect();
        {
            let mut queue = self.queue.lock();
            queue.extend(fresh);
        }

        self.counters.expansions.fetch_add(1, Ordering::Relaxed);
        self.expanding.store(false, Ordering::Release);

        debug!(
            "Recycler[{}] 확장 완료 - {}개 추가, 용량 {} -> {}",
            self.id,
            added,
            total,
            total + added
        );
    }

    /// `Pooled` drop 경로
    fn release(self: &Arc<Self>, mut elem: T) {
        elem.reset();

        {
            let mut queue = self.queue.lock();
            queue.push_back(elem);
            self.usage.fetch_sub(1, Ordering::AcqRel);
        }

        trace!("Recycler[{}] 객체 반환", self.id);
        self.schedule_shrink();
    }

    /// 수축 타이머가 없고 확장 중이 아니면 지연 수축 검사를 예약합니다.
    ///
    /// 확장 플래그는 타이머 락을 쥔 채 검사합니다. `expand`의 취소도 같은 락을
    /// 거치므로 확장 중에 새 타이머가 남지 않습니다.
    fn schedule_shrink(self: &Arc<Self>) {
        let mut timer = self.shrink_timer.lock();
        if timer.is_some() || self.expanding.load(Ordering::Acquire) {
            return;
        }

        let seq = self.shrink_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = self.config.shrink_delay;
        let weak = Arc::downgrade(self);

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.shrink(seq);
            }
        });

        *timer = Some(ShrinkTimer { seq, handle });
    }

    fn shrink(&self, seq: u64) {
        if !self.expanding.load(Ordering::Acquire) {
            self.shrink_now();
        } else {
            debug!("Recycler[{}] 확장 중이므로 수축 취소", self.id);
        }

        let mut timer = self.shrink_timer.lock();
        if timer.as_ref().is_some_and(|t| t.seq == seq) {
            *timer = None;
        }
    }

    fn shrink_now(&self) {
        let mut queue = self.queue.lock();
        let usage = self.usage.load(Ordering::Acquire);
        let total = queue.len() + usage;

        if total == 0 || (usage as f64) >= total as f64 * self.config.shrink_threshold as f64 {
            return;
        }

        let mut removed = (total as f64 * self.config.shrink_scale as f64).floor() as usize;
        if total.saturating_sub(removed) < self.config.minimum_capacity {
            removed = total.saturating_sub(self.config.minimum_capacity);
        }
        removed = removed.min(queue.len());

        if removed == 0 {
            return;
        }

        queue.drain(..removed);
        drop(queue);

        self.counters.shrinks.fetch_add(1, Ordering::Relaxed);
        self.counters
            .discarded
            .fetch_add(removed as u64, Ordering::Relaxed);

        debug!(
            "Recycler[{}] 수축 완료 - {}개 폐기, 용량 {} -> {}",
            self.id,
            removed,
            total,
            total - removed
        );
    }

    fn cancel_shrink(&self) {
        if let Some(timer) = self.shrink_timer.lock().take() {
            timer.handle.abort();
            debug!("Recycler[{}] 대기 중인 수축 취소", self.id);
        }
    }
}

impl<T: Recyclable> Drop for RecyclerInner<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.shrink_timer.get_mut().take() {
            timer.handle.abort();
        }
    }
}

/// 자동 반환 핸들
///
/// drop되면 객체의 `reset`이 호출되고 원래 풀로 돌아갑니다.
/// 풀이 먼저 사라졌다면 객체는 그냥 해제됩니다.
pub struct Pooled<T: Recyclable> {
    value: Option<T>,
    state: RecycleState,
    owner: u64,
    pool: Weak<RecyclerInner<T>>,
}

impl<T: Recyclable> Pooled<T> {
    /// 이 객체를 발급한 풀의 id
    pub fn owner(&self) -> u64 {
        self.owner
    }

    pub fn state(&self) -> RecycleState {
        self.state
    }

    /// 획득 후 아직 값이 쓰이지 않았으면 true
    pub fn is_unused(&self) -> bool {
        self.state.is_unused()
    }

    /// 명시적 반환 (drop과 동일)
    pub fn recycle(self) {
        drop(self);
    }

    fn value_ref(&self) -> &T {
        match self.value.as_ref() {
            Some(value) => value,
            None => unreachable!("Pooled 값은 drop 전까지 항상 존재합니다"),
        }
    }
}

impl<T: Recyclable> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value_ref()
    }
}

impl<T: Recyclable> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        if self.state == RecycleState::Unused {
            self.state = RecycleState::InUse;
        }
        match self.value.as_mut() {
            Some(value) => value,
            None => unreachable!("Pooled 값은 drop 전까지 항상 존재합니다"),
        }
    }
}

impl<T: Recyclable + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("owner", &self.owner)
            .field("state", &self.state)
            .field("value", &self.value)
            .finish()
    }
}

impl<T: Recyclable> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            match self.pool.upgrade() {
                Some(pool) => pool.release(value),
                None => trace!("Recycler[{}] 이미 해제됨, 객체 폐기", self.owner),
            }
        }
    }
}
