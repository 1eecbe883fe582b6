//! 게임 월드
//!
//! 전역 큐, 패키지 풀, 매니저 시스템을 소유하고 시작/종료 순서를 관리합니다.

use crate::config::{validate_config, ServerConfig};
use crate::manager::{Manager, ManagerSystem, PlayerManager};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{info, warn};
use uranus_shared::reactor::{GlobalQueue, SchedulerStats, TaskQueueRef};
use uranus_shared::recycler::{Package, PackageHeader, Pooled, Recycler, RecyclerStats};

/// 월드 통계 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldStats {
    pub server_name: String,
    pub managers: usize,
    pub scheduler: SchedulerStats,
    pub package_pool: RecyclerStats,
}

/// 게임 월드
pub struct GameWorld {
    config: ServerConfig,
    runtime: Handle,
    managers: ManagerSystem,
    packages: Recycler<Package>,
    global: GlobalQueue,
    running: bool,
}

impl GameWorld {
    /// 월드 생성
    ///
    /// 기본 매니저가 등록되지만 `start` 전까지는 아무 작업도 실행되지 않습니다.
    pub fn new(config: ServerConfig, runtime: Handle) -> Result<Self> {
        validate_config(&config)?;

        let global =
            GlobalQueue::new(config.scheduler.clone()).context("전역 큐 생성 실패")?;

        let header = PackageHeader::default();
        let packages = Recycler::new(config.package_pool.clone(), runtime.clone(), move || {
            Package::with_header(header)
        })
        .context("패키지 풀 생성 실패")?;

        let mut managers = ManagerSystem::new();
        managers.register(&global, PlayerManager::new());

        Ok(Self {
            config,
            runtime,
            managers,
            packages,
            global,
            running: false,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 추가 매니저 등록 (`start` 전에 호출)
    pub fn register_manager<M: Manager>(&mut self, manager: M) -> bool {
        if self.running {
            warn!("월드 실행 중에는 매니저를 등록할 수 없습니다: {}", manager.name());
            return false;
        }
        self.managers.register(&self.global, manager)
    }

    /// 전역 큐, 패키지 풀, 매니저 시스템 순으로 시작
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            warn!("게임 월드가 이미 실행 중입니다");
            return Ok(());
        }

        info!("🚀 게임 월드 시작 중... ({})", self.config.server_name);

        self.global.start().context("전역 큐 시작 실패")?;
        self.packages.init(self.config.package_pool.default_capacity);
        self.managers
            .start(&self.runtime, self.config.tick_interval);

        self.running = true;
        info!("✅ 게임 월드 실행 중: {}", self.config.server_name);
        Ok(())
    }

    /// 매니저 틱 중지 후 전역 큐 종료
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }

        info!("🛑 게임 월드 중지 중...");
        self.managers.stop();
        self.global.shutdown();
        self.running = false;
        info!("✅ 게임 월드가 성공적으로 중지되었습니다");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn global(&self) -> &GlobalQueue {
        &self.global
    }

    pub fn managers(&self) -> &ManagerSystem {
        &self.managers
    }

    pub fn manager<M: Manager>(&self) -> Option<TaskQueueRef<M>> {
        self.managers.get::<M>()
    }

    pub fn packages(&self) -> &Recycler<Package> {
        &self.packages
    }

    /// 패키지 하나 획득 (시작 전이면 `None`)
    pub fn acquire_package(&self) -> Option<Pooled<Package>> {
        self.packages.acquire()
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            server_name: self.config.server_name.clone(),
            managers: self.managers.len(),
            scheduler: self.global.stats(),
            package_pool: self.packages.stats(),
        }
    }
}

impl Drop for GameWorld {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uranus_shared::SchedulerConfig;

    fn test_config() -> ServerConfig {
        ServerConfig {
            tick_interval: Duration::from_millis(10),
            scheduler: SchedulerConfig::with_workers(2),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_package_unavailable_before_start() {
        let world = GameWorld::new(test_config(), Handle::current()).expect("world");
        assert!(world.acquire_package().is_none());
        assert!(!world.is_running());
        assert_eq!(world.managers().len(), 1);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut world = GameWorld::new(test_config(), Handle::current()).expect("world");
        world.start().expect("start");
        assert!(world.is_running());
        assert_eq!(world.packages().capacity(), 64);

        let stats = world.stats();
        assert_eq!(stats.scheduler.workers, 2);
        assert_eq!(stats.managers, 1);

        world.shutdown();
        world.shutdown();
        assert!(!world.is_running());
    }

    #[tokio::test]
    async fn test_duplicate_manager_rejected() {
        let mut world = GameWorld::new(test_config(), Handle::current()).expect("world");
        assert!(!world.register_manager(PlayerManager::new()));
        assert!(world.manager::<PlayerManager>().is_some());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = ServerConfig {
            server_name: "  ".to_string(),
            ..test_config()
        };
        assert!(GameWorld::new(config, Handle::current()).is_err());
    }
}
