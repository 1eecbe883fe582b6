//! 매니저 시스템
//!
//! 매니저는 타입별로 하나씩 등록되는 리액터입니다. 월드가 시작되면
//! 각 매니저의 `init`이 자기 큐에서 실행되고, 이후 틱 루프가 주기적으로
//! `on_tick`을, UTC 날짜가 바뀌면 `on_day_change`를 큐에 넣습니다.

pub mod player_manager;

pub use player_manager::PlayerManager;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uranus_shared::reactor::{GlobalQueue, QueueId, Reactor, ReactorHandle, TaskQueueRef};

/// 게임 로직 매니저
pub trait Manager: Reactor {
    fn name(&self) -> &'static str;

    /// 월드 시작 시 자기 큐에서 한 번 실행
    fn init(&mut self) {}

    /// 틱을 받을지 여부 (등록 시점에 한 번 읽음)
    fn wants_tick(&self) -> bool {
        false
    }

    fn on_tick(&mut self, _now: DateTime<Utc>) {}

    fn on_day_change(&mut self) {}
}

/// 타입을 지운 매니저 항목
trait ManagerEntry: Send + Sync {
    fn name(&self) -> &'static str;
    fn id(&self) -> QueueId;
    fn push_init(&self);
    fn invoke(&self, method: &str, payload: Bytes);
    fn ticker(&self) -> Option<Box<dyn TickTarget>>;
    fn as_any(&self) -> &dyn Any;
}

/// 틱 루프가 보관하는 비소유 참조
trait TickTarget: Send + Sync {
    fn tick(&self, now: DateTime<Utc>);
    fn day_change(&self);
}

struct Slot<M: Manager> {
    name: &'static str,
    ticking: bool,
    handle: ReactorHandle<M>,
}

impl<M: Manager> ManagerEntry for Slot<M> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn id(&self) -> QueueId {
        self.handle.id()
    }

    fn push_init(&self) {
        self.handle.push_task(|manager: &mut M| {
            manager.init();
            debug!("{} 초기화 완료", manager.name());
        });
    }

    fn invoke(&self, method: &str, payload: Bytes) {
        self.handle.invoke(method, payload);
    }

    fn ticker(&self) -> Option<Box<dyn TickTarget>> {
        self.ticking
            .then(|| Box::new(self.handle.downgrade()) as Box<dyn TickTarget>)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<M: Manager> TickTarget for TaskQueueRef<M> {
    fn tick(&self, now: DateTime<Utc>) {
        self.push_task(move |manager: &mut M| manager.on_tick(now));
    }

    fn day_change(&self) {
        self.push_task(|manager: &mut M| manager.on_day_change());
    }
}

/// UTC 날짜 변경 감지기
#[derive(Debug, Clone, Copy)]
pub struct DayTracker {
    current: NaiveDate,
}

impl DayTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current: now.date_naive(),
        }
    }

    /// 날짜가 바뀌었으면 `true`
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        if today != self.current {
            self.current = today;
            true
        } else {
            false
        }
    }
}

/// 매니저 시스템
#[derive(Default)]
pub struct ManagerSystem {
    managers: HashMap<TypeId, Box<dyn ManagerEntry>>,
    tick_handle: Option<JoinHandle<()>>,
}

impl ManagerSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// 매니저 등록. 같은 타입이 이미 있으면 `false`.
    pub fn register<M: Manager>(&mut self, global: &GlobalQueue, manager: M) -> bool {
        let type_id = TypeId::of::<M>();
        if self.managers.contains_key(&type_id) {
            warn!("{} 이미 등록된 매니저", manager.name());
            return false;
        }

        let name = manager.name();
        let ticking = manager.wants_tick();
        let handle = global.register_reactor(manager);
        info!("매니저 등록: {} ({})", name, handle.id());

        self.managers.insert(
            type_id,
            Box::new(Slot {
                name,
                ticking,
                handle,
            }),
        );
        true
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// 타입으로 매니저 큐 참조 조회
    pub fn get<M: Manager>(&self) -> Option<TaskQueueRef<M>> {
        self.managers
            .get(&TypeId::of::<M>())?
            .as_any()
            .downcast_ref::<Slot<M>>()
            .map(|slot| slot.handle.downgrade())
    }

    /// 이름으로 매니저를 찾아 `invoke` 전달. 없으면 `false`.
    pub fn invoke(&self, name: &str, method: &str, payload: impl Into<Bytes>) -> bool {
        match self.managers.values().find(|entry| entry.name() == name) {
            Some(entry) => {
                entry.invoke(method, payload.into());
                true
            }
            None => {
                debug!("알 수 없는 매니저 invoke 무시: {}", name);
                false
            }
        }
    }

    /// 각 매니저의 `init`을 예약하고 틱 루프를 시작합니다.
    pub fn start(&mut self, runtime: &Handle, tick_interval: Duration) {
        if self.tick_handle.is_some() {
            warn!("매니저 시스템이 이미 실행 중입니다");
            return;
        }

        for entry in self.managers.values() {
            entry.push_init();
        }

        let targets: Arc<Vec<Box<dyn TickTarget>>> = Arc::new(
            self.managers
                .values()
                .filter_map(|entry| entry.ticker())
                .collect(),
        );

        info!(
            "매니저 시스템 시작 - 매니저 {}개, 틱 대상 {}개, 간격 {:?}",
            self.managers.len(),
            targets.len(),
            tick_interval
        );

        self.tick_handle = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut days = DayTracker::new(Utc::now());

            loop {
                ticker.tick().await;

                let now = Utc::now();
                let day_changed = days.advance(now);
                if day_changed {
                    info!("날짜 변경 감지: {}", now.date_naive());
                }

                for target in targets.iter() {
                    target.tick(now);
                    if day_changed {
                        target.day_change();
                    }
                }
            }
        }));
    }

    pub fn is_running(&self) -> bool {
        self.tick_handle.is_some()
    }

    /// 틱 루프 중지
    pub fn stop(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            handle.abort();
            info!("매니저 시스템 틱 루프 중지");
        }
    }
}

impl Drop for ManagerSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uranus_shared::SchedulerConfig;

    struct Quiet;
    impl Reactor for Quiet {}
    impl Manager for Quiet {
        fn name(&self) -> &'static str {
            "Quiet"
        }
    }

    #[test]
    fn test_day_tracker_rollover() {
        let before = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 1).unwrap();

        let mut days = DayTracker::new(before);
        assert!(!days.advance(before));
        assert!(days.advance(after));
        assert!(!days.advance(after));
    }

    #[test]
    fn test_register_by_type_once() {
        let global = GlobalQueue::new(SchedulerConfig::with_workers(1)).expect("config");
        let mut system = ManagerSystem::new();

        assert!(system.register(&global, Quiet));
        assert!(!system.register(&global, Quiet));
        assert_eq!(system.len(), 1);
        assert!(system.get::<Quiet>().is_some());
        assert!(system.get::<PlayerManager>().is_none());
    }

    #[test]
    fn test_invoke_unknown_manager() {
        let system = ManagerSystem::new();
        assert!(!system.invoke("Nobody", "login", Bytes::new()));
    }
}
